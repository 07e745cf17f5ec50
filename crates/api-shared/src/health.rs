use crate::types::HealthRes;

/// Simple health service shared by the REST API and the combined binary.
///
/// Reports liveness together with the two figures an operator checks first: how many records are
/// waiting for review and where commits go.
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance.
    ///
    /// # Arguments
    /// * `pending` - Current pending queue length
    /// * `backend` - Description of the durable backend
    pub fn check_health(pending: usize, backend: &str) -> HealthRes {
        HealthRes {
            ok: true,
            message: "Scout is alive".into(),
            pending,
            backend: backend.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_reports_queue_and_backend() {
        let res = HealthService::check_health(3, "scout_sheet.csv");
        assert!(res.ok);
        assert_eq!(res.pending, 3);
        assert_eq!(res.backend, "scout_sheet.csv");
    }
}
