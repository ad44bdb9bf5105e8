/*!
 * Volume Binder Boundary
 * The persistent-volume binding machinery (CSI, storage classes, PVC/PV
 * matching) lives in the orchestrator and is out of scope here.
 * The context only drives this trait through the `AssumePod` handshake.
 */

use crate::errors::VolumeBindingError;

#[derive(Debug, Clone, Default)]
pub struct PodVolumeClaims {
    pub claim_names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PodVolumes {
    pub conflict_reasons: Vec<String>,
    pub all_bound: bool,
}

#[cfg_attr(test, mockall::automock)]
pub trait VolumeBinder: Send + Sync {
    fn get_pod_volume_claims(&self, pod_uid: &str) -> Result<PodVolumeClaims, VolumeBindingError>;

    fn find_pod_volumes(
        &self,
        pod_uid: &str,
        node_name: &str,
    ) -> Result<PodVolumes, VolumeBindingError>;

    fn assume_pod_volumes(
        &self,
        pod_uid: &str,
        node_name: &str,
    ) -> Result<(), VolumeBindingError>;
}
