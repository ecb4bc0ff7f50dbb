use std::path::PathBuf;

/// Failures while interrogating a playback endpoint. All of these abort the
/// sink pipeline; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("playback endpoint '{device}' not found")]
    NotFound { device: String },

    #[error("playback endpoint '{device}' is busy (held open by another process)")]
    Busy { device: String },

    #[error("playback endpoint '{device}' accepted no usable {what}")]
    Unsupported { device: String, what: &'static str },

    #[error("ALSA error on '{device}': {source}")]
    Alsa {
        device: String,
        #[source]
        source: alsa::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The single abort condition of the sink pipeline. Carries both
    /// capability sets so the operator can see what failed to overlap.
    #[error("no common {missing} between '{a}' ({a_caps}) and '{b}' ({b_caps})")]
    NoCommonFormat {
        missing: &'static str,
        a: String,
        b: String,
        a_caps: String,
        b_caps: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GadgetError {
    #[error("no UDC controller available under {dir}")]
    NoControllerAvailable { dir: PathBuf },

    /// Rewriting the descriptor tree while bound is undefined behavior at the
    /// kernel interface, so the tree builder refuses it outright.
    #[error("refusing to touch '{field}' while bound to '{udc}'")]
    MutateWhileBound { field: String, udc: String },

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
