use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use uacmix::error::GadgetError;
use uacmix::gadget::{Controller, Phase};
use uacmix::profile::Profile;
use uacmix::service::ServiceControl;

#[derive(Clone, Default)]
struct RecordingService {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingService {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ServiceControl for RecordingService {
    fn stop(&self, unit: &str) -> std::io::Result<bool> {
        self.calls.lock().unwrap().push(format!("stop {unit}"));
        Ok(true)
    }

    fn start(&self, unit: &str) -> std::io::Result<bool> {
        self.calls.lock().unwrap().push(format!("start {unit}"));
        Ok(true)
    }
}

fn test_profile(root: &Path) -> Profile {
    Profile {
        configfs_root: root.join("usb_gadget"),
        udc_class_dir: root.join("udc"),
        ..Profile::default()
    }
}

fn add_controller(root: &Path, name: &str) {
    let dir = root.join("udc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), "").unwrap();
}

fn function_links(gadget_dir: &Path) -> usize {
    fs::read_dir(gadget_dir.join("configs").join("c.1"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            fs::symlink_metadata(e.path())
                .map(|m| m.is_symlink())
                .unwrap_or(false)
        })
        .count()
}

#[test]
fn full_sequence_twice_converges_to_same_bound_state() {
    let tmp = tempdir().unwrap();
    add_controller(tmp.path(), "fe980000.usb");
    let profile = test_profile(tmp.path());
    let service = RecordingService::default();
    let controller = Controller::new(&profile, service.clone());

    controller.run_default_sequence().unwrap();
    controller.run_default_sequence().unwrap();

    let fs_view = controller.gadget_fs();
    assert_eq!(fs_view.bound().unwrap().as_deref(), Some("fe980000.usb"));
    assert_eq!(function_links(fs_view.dir()), 1);

    let id_vendor = fs::read_to_string(fs_view.dir().join("idVendor")).unwrap();
    assert_eq!(id_vendor.trim(), "0x1d6b");
    let chmask = fs::read_to_string(
        fs_view
            .dir()
            .join("functions")
            .join("uac2.usb0")
            .join("c_chmask"),
    )
    .unwrap();
    assert_eq!(chmask.trim(), "3");

    let unit = &profile.consumer_unit;
    assert_eq!(
        service.calls(),
        vec![
            format!("stop {unit}"),
            format!("start {unit}"),
            format!("stop {unit}"),
            format!("start {unit}"),
        ]
    );
}

#[test]
fn unbind_when_already_unbound_succeeds() {
    let tmp = tempdir().unwrap();
    let profile = test_profile(tmp.path());
    let controller = Controller::new(&profile, RecordingService::default());

    controller.run(Phase::Unbind).unwrap();
    controller.run(Phase::Unbind).unwrap();
    assert!(controller.gadget_fs().bound().unwrap().is_none());
}

#[test]
fn missing_controller_listing_is_fatal_and_leaves_gadget_unbound() {
    let tmp = tempdir().unwrap();
    let profile = test_profile(tmp.path());
    let controller = Controller::new(&profile, RecordingService::default());

    let err = controller.run(Phase::Reconfigure).unwrap_err();
    assert!(matches!(err, GadgetError::NoControllerAvailable { .. }));
    assert!(controller.gadget_fs().bound().unwrap().is_none());
}

#[test]
fn pinned_controller_is_used_without_enumeration() {
    let tmp = tempdir().unwrap();
    let profile = Profile {
        udc: Some("pinned.usb".to_string()),
        ..test_profile(tmp.path())
    };
    let controller = Controller::new(&profile, RecordingService::default());

    controller.run(Phase::Reconfigure).unwrap();
    assert_eq!(
        controller.gadget_fs().bound().unwrap().as_deref(),
        Some("pinned.usb")
    );
}

#[test]
fn reconfigure_while_bound_leaves_tree_untouched() {
    let tmp = tempdir().unwrap();
    add_controller(tmp.path(), "fe980000.usb");
    let profile = test_profile(tmp.path());
    let controller = Controller::new(&profile, RecordingService::default());

    controller.run(Phase::Reconfigure).unwrap();
    let dir = controller.gadget_fs().dir().to_path_buf();
    fs::write(dir.join("idVendor"), "0xbeef\n").unwrap();

    controller.run(Phase::Reconfigure).unwrap();
    let id_vendor = fs::read_to_string(dir.join("idVendor")).unwrap();
    assert_eq!(id_vendor.trim(), "0xbeef");
    assert_eq!(
        controller.gadget_fs().bound().unwrap().as_deref(),
        Some("fe980000.usb")
    );
}
