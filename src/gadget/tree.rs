use crate::error::GadgetError;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FUNCTION: &str = "uac2.usb0";
pub const CONFIG: &str = "c.1";
const LANG: &str = "strings/0x409";

/// Typed view of one gadget instance under the configfs root. All descriptor
/// mutation goes through here so the "no rewrite while bound" rule is
/// enforced in one place instead of at every call site.
#[derive(Debug)]
pub struct GadgetFs {
    dir: PathBuf,
    udc_class_dir: PathBuf,
}

impl GadgetFs {
    pub fn new(configfs_root: &Path, name: &str, udc_class_dir: &Path) -> Self {
        Self {
            dir: configfs_root.join(name),
            udc_class_dir: udc_class_dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The controller currently owning the gadget, if any. A missing gadget
    /// directory reads as unbound.
    pub fn bound(&self) -> Result<Option<String>, GadgetError> {
        let path = self.dir.join("UDC");
        match fs::read_to_string(&path) {
            Ok(text) => {
                let name = text.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(GadgetError::Io {
                op: "read",
                path,
                source,
            }),
        }
    }

    /// Creates the directory skeleton: identity, string table, one capture
    /// function and one configuration grouping. Idempotent.
    pub fn ensure_tree(&self) -> Result<(), GadgetError> {
        for sub in [
            self.dir.clone(),
            self.dir.join(LANG),
            self.dir.join("functions").join(FUNCTION),
            self.dir.join("configs").join(CONFIG).join(LANG),
        ] {
            fs::create_dir_all(&sub).map_err(|source| GadgetError::Io {
                op: "mkdir",
                path: sub.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Writes one attribute relative to the gadget directory. Refused while
    /// bound.
    pub fn set_field(&self, rel: &str, value: &str) -> Result<(), GadgetError> {
        self.refuse_while_bound(rel)?;
        let path = self.dir.join(rel);
        fs::write(&path, format!("{value}\n")).map_err(|source| GadgetError::Io {
            op: "write",
            path,
            source,
        })
    }

    /// Links the capture function into the configuration grouping. An
    /// existing link is left alone.
    pub fn link_function(&self) -> Result<(), GadgetError> {
        let link = self.dir.join("configs").join(CONFIG).join(FUNCTION);
        self.refuse_while_bound(FUNCTION)?;
        if fs::symlink_metadata(&link).is_ok() {
            debug!(link = %link.display(), "function link already present");
            return Ok(());
        }
        let target = self.dir.join("functions").join(FUNCTION);
        symlink(&target, &link).map_err(|source| GadgetError::Io {
            op: "symlink",
            path: link,
            source,
        })
    }

    /// Removes the function link. Returns whether one was actually removed;
    /// absence is success. Refused while bound.
    pub fn unlink_function(&self) -> Result<bool, GadgetError> {
        self.refuse_while_bound(FUNCTION)?;
        let link = self.dir.join("configs").join(CONFIG).join(FUNCTION);
        match fs::remove_file(&link) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(GadgetError::Io {
                op: "unlink",
                path: link,
                source,
            }),
        }
    }

    pub fn bind(&self, udc: &str) -> Result<(), GadgetError> {
        let path = self.dir.join("UDC");
        fs::write(&path, format!("{udc}\n")).map_err(|source| GadgetError::Io {
            op: "write",
            path,
            source,
        })
    }

    /// Clears the binding. The kernel treats an empty write as release.
    pub fn unbind(&self) -> Result<(), GadgetError> {
        let path = self.dir.join("UDC");
        fs::write(&path, "\n").map_err(|source| GadgetError::Io {
            op: "write",
            path,
            source,
        })
    }

    /// Controllers the host reports as available, sorted for a deterministic
    /// first pick. A missing enumeration directory reads as empty.
    pub fn list_controllers(&self) -> Result<Vec<String>, GadgetError> {
        let entries = match fs::read_dir(&self.udc_class_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(GadgetError::Io {
                    op: "list",
                    path: self.udc_class_dir.clone(),
                    source,
                });
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn udc_class_dir(&self) -> &Path {
        &self.udc_class_dir
    }

    fn refuse_while_bound(&self, field: &str) -> Result<(), GadgetError> {
        if let Some(udc) = self.bound()? {
            return Err(GadgetError::MutateWhileBound {
                field: field.to_string(),
                udc,
            });
        }
        Ok(())
    }
}
