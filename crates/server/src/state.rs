use std::sync::Arc;

use tera::Tera;

use sentinel_agent::PriceEstimator;
use sentinel_db::repositories::{AlertRepository, ProfileRepository, RepositoryProvisioner};

use crate::gate::EstimateGate;
use crate::pages;

#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub estimator: PriceEstimator,
    pub estimate_gate: EstimateGate,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        alerts: Arc<dyn AlertRepository>,
        estimator: PriceEstimator,
    ) -> Self {
        Self {
            profiles,
            alerts,
            estimator,
            estimate_gate: EstimateGate::default(),
            templates: pages::templates(),
        }
    }

    pub fn provisioner(&self) -> RepositoryProvisioner {
        RepositoryProvisioner::new(self.profiles.clone())
    }
}
