use crate::error::GadgetError;
use crate::gadget::tree::{CONFIG, FUNCTION, GadgetFs};
use crate::profile::Profile;
use crate::service::ServiceControl;
use std::io::ErrorKind;
use tracing::{debug, info, warn};

/// One lifecycle phase. Each is independently invokable and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    StopConsumer,
    Unbind,
    Reconfigure,
    StartConsumer,
}

/// The default invocation order. Stopping the consumer first guarantees it
/// never holds the device open while the descriptor tree is rewritten, and
/// unbinding before reconfiguring rules out a double bind.
pub const DEFAULT_SEQUENCE: [Phase; 4] = [
    Phase::StopConsumer,
    Phase::Unbind,
    Phase::Reconfigure,
    Phase::StartConsumer,
];

/// Drives the gadget through its lifecycle against one [`Profile`].
pub struct Controller<'a, S: ServiceControl> {
    profile: &'a Profile,
    fs: GadgetFs,
    service: S,
}

impl<'a, S: ServiceControl> Controller<'a, S> {
    pub fn new(profile: &'a Profile, service: S) -> Self {
        let fs = GadgetFs::new(
            &profile.configfs_root,
            &profile.gadget_name,
            &profile.udc_class_dir,
        );
        Self {
            profile,
            fs,
            service,
        }
    }

    pub fn gadget_fs(&self) -> &GadgetFs {
        &self.fs
    }

    pub fn run(&self, phase: Phase) -> Result<(), GadgetError> {
        match phase {
            Phase::StopConsumer => self.stop_consumer(),
            Phase::Unbind => self.unbind(),
            Phase::Reconfigure => self.reconfigure(),
            Phase::StartConsumer => self.start_consumer(),
        }
    }

    pub fn run_default_sequence(&self) -> Result<(), GadgetError> {
        for phase in DEFAULT_SEQUENCE {
            self.run(phase)?;
        }
        Ok(())
    }

    fn stop_consumer(&self) -> Result<(), GadgetError> {
        let unit = &self.profile.consumer_unit;
        match self.service.stop(unit) {
            Ok(true) => info!(%unit, "consumer stopped"),
            Ok(false) => info!(%unit, "consumer already stopped"),
            Err(e) => warn!(%unit, error = %e, "could not signal consumer stop"),
        }
        Ok(())
    }

    fn unbind(&self) -> Result<(), GadgetError> {
        match self.fs.bound()? {
            Some(udc) => match self.fs.unbind() {
                Ok(()) => info!(%udc, "gadget unbound"),
                // Not the same as "already unbound": a failed clear can mean
                // a stuck controller, so it gets its own message.
                Err(e) => warn!(%udc, error = %e, "binding clear failed, controller may be stuck"),
            },
            None => debug!("gadget already unbound"),
        }

        if self.fs.bound()?.is_some() {
            warn!("still bound, leaving function link in place");
            return Ok(());
        }
        match self.fs.unlink_function()? {
            true => debug!("function link removed"),
            false => debug!("function link already absent"),
        }
        Ok(())
    }

    fn reconfigure(&self) -> Result<(), GadgetError> {
        if let Some(udc) = self.fs.bound()? {
            info!(%udc, "gadget already bound, descriptor tree left untouched");
            return Ok(());
        }

        let p = self.profile;
        self.fs.ensure_tree()?;

        self.fs
            .set_field("idVendor", &format!("{:#06x}", p.vendor_id))?;
        self.fs
            .set_field("idProduct", &format!("{:#06x}", p.product_id))?;
        self.fs
            .set_field("bcdDevice", &format!("{:#06x}", p.device_version))?;
        self.fs
            .set_field("bcdUSB", &format!("{:#06x}", p.usb_version))?;

        self.fs
            .set_field("strings/0x409/manufacturer", &p.manufacturer)?;
        self.fs.set_field("strings/0x409/product", &p.product)?;
        self.fs.set_field("strings/0x409/serialnumber", &p.serial)?;

        let func = format!("functions/{FUNCTION}");
        self.fs
            .set_field(&format!("{func}/c_chmask"), &p.capture_channel_mask.to_string())?;
        self.fs
            .set_field(&format!("{func}/c_srate"), &p.capture_rate.to_string())?;
        self.fs
            .set_field(&format!("{func}/c_ssize"), &p.capture_sample_size.to_string())?;
        // Capture-only gadget: suppress the playback direction entirely.
        self.fs.set_field(&format!("{func}/p_chmask"), "0")?;
        self.set_volume_field(&format!("{func}/c_volume_min"), p.volume_min)?;
        self.set_volume_field(&format!("{func}/c_volume_max"), p.volume_max)?;
        self.set_volume_field(&format!("{func}/c_volume_res"), p.volume_res)?;

        self.fs.set_field(
            &format!("configs/{CONFIG}/strings/0x409/configuration"),
            &p.configuration,
        )?;
        self.fs
            .set_field(&format!("configs/{CONFIG}/MaxPower"), &p.max_power.to_string())?;

        self.fs.link_function()?;

        let udc = match &p.udc {
            Some(name) => name.clone(),
            None => {
                let available = self.fs.list_controllers()?;
                match available.into_iter().next() {
                    Some(name) => name,
                    None => {
                        return Err(GadgetError::NoControllerAvailable {
                            dir: self.fs.udc_class_dir().to_path_buf(),
                        });
                    }
                }
            }
        };
        self.fs.bind(&udc)?;
        info!(%udc, "gadget bound");
        Ok(())
    }

    fn start_consumer(&self) -> Result<(), GadgetError> {
        let unit = &self.profile.consumer_unit;
        match self.service.start(unit) {
            Ok(true) => info!(%unit, "consumer started"),
            Ok(false) => warn!(%unit, "consumer failed to start"),
            Err(e) => warn!(%unit, error = %e, "could not signal consumer start"),
        }
        Ok(())
    }

    /// Volume attributes are missing on older kernels; their absence is not a
    /// reason to fail the whole reconfiguration.
    fn set_volume_field(&self, rel: &str, value: i32) -> Result<(), GadgetError> {
        match self.fs.set_field(rel, &value.to_string()) {
            Err(GadgetError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(attr = rel, "kernel lacks volume attribute, skipping");
                Ok(())
            }
            other => other,
        }
    }
}
