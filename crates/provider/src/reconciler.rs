//! Reconciler
//!
//! One orchestration routine shared by every resource kind. It fetches the
//! collection, indexes it, picks a branch from the declared state and the
//! presence of the key, and issues at most one mutating request. The
//! per-kind rules come from the `MergePolicy` it is instantiated with.

use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::{debug, info};

use nfvis_common::{Error, Method, Outcome, Report, Result, State};

use crate::client::ResourceClient;
use crate::index::ResourceIndex;
use crate::report::{Failure, OutcomeReporter};
use crate::resources::{wrap, MergePolicy};

/// Caller switches for one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Decide the outcome without issuing the mutating request
    pub preview: bool,
    /// Treat a create or update response without a document as an error
    pub require_confirmation: bool,
}

/// Drives one resource kind towards its declared state
pub struct Reconciler<'a, C: ?Sized, P> {
    client: &'a C,
    options: ReconcileOptions,
    _policy: PhantomData<fn() -> P>,
}

impl<'a, C, P> Reconciler<'a, C, P>
where
    C: ResourceClient + ?Sized,
    P: MergePolicy,
{
    pub fn new(client: &'a C, options: ReconcileOptions) -> Self {
        Self {
            client,
            options,
            _policy: PhantomData,
        }
    }

    /// Bring the instance named by `spec` to `state`
    pub async fn reconcile(&self, spec: &P::Spec, state: State) -> std::result::Result<Report, Failure> {
        let key = P::key(spec);
        let mut reporter = OutcomeReporter::new(P::KIND, key.clone(), state, self.options.preview);

        match self.run(spec, state, &key, &mut reporter).await {
            Ok(outcome) => {
                info!("{} '{}': {}", P::KIND, key, outcome);
                Ok(reporter.finish(outcome))
            }
            Err(error) => Err(reporter.fail(error)),
        }
    }

    async fn run(
        &self,
        spec: &P::Spec,
        state: State,
        key: &str,
        reporter: &mut OutcomeReporter,
    ) -> Result<Outcome> {
        let kind = P::KIND;

        let key_field = kind.key_field().unwrap_or("key");
        if key.trim().is_empty() {
            return Err(Error::validation(key_field, "must not be empty"));
        }
        // keys are spliced into the instance path verbatim
        if key.contains(['/', '?', '#']) {
            return Err(Error::validation(
                key_field,
                format!("'{}' must not contain '/', '?' or '#'", key),
            ));
        }

        match state {
            State::Present => P::validate(spec)?,
            State::Absent if !kind.supports_delete() => {
                return Err(Error::Unsupported {
                    kind,
                    operation: "delete",
                });
            }
            State::Absent => {}
        }

        let fetch_path = kind.fetch_path();
        reporter.record_request(Method::Get, &fetch_path, None);
        let document = self.client.fetch(&fetch_path, kind.fetch_media()).await?;

        let mut index = ResourceIndex::build(kind, document);
        debug!("Indexed {} {} instance(s)", index.len(), kind);

        let existing = index.remove(key);
        reporter.observe_current(existing.as_ref());

        match (state, existing) {
            (State::Present, None) => self.create(spec, reporter).await,
            (State::Present, Some(current)) => self.update(spec, key, current, reporter).await,
            (State::Absent, Some(_)) => {
                let path = kind.instance_path(key);
                self.mutate(Method::Delete, &path, None, Outcome::Deleted, reporter)
                    .await
            }
            (State::Absent, None) => {
                debug!("{} '{}' already absent", kind, key);
                Ok(Outcome::Unchanged)
            }
        }
    }

    async fn create(&self, spec: &P::Spec, reporter: &mut OutcomeReporter) -> Result<Outcome> {
        let kind = P::KIND;
        if !kind.supports_create() {
            return Err(Error::Unsupported {
                kind,
                operation: "create",
            });
        }

        let payload = wrap(kind, P::build(spec)?);
        self.mutate(
            Method::Post,
            kind.create_path(),
            Some(payload),
            Outcome::Created,
            reporter,
        )
        .await
    }

    async fn update(
        &self,
        spec: &P::Spec,
        key: &str,
        current: Value,
        reporter: &mut OutcomeReporter,
    ) -> Result<Outcome> {
        let kind = P::KIND;
        let path = kind.instance_path(key);

        if P::replaces_existing(spec) {
            let body = P::build(spec)?;
            let fields: Vec<&str> = body.keys().map(String::as_str).collect();
            reporter.record_fields(&fields);
            let payload = wrap(kind, body);
            return self
                .mutate(Method::Put, &path, Some(payload), Outcome::Updated, reporter)
                .await;
        }

        if !kind.supports_update() {
            debug!("{} '{}' exists and cannot be updated", kind, key);
            return Ok(Outcome::Unchanged);
        }

        let mut document = match current {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let changed = P::merge(spec, &mut document)?;
        if changed.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        debug!("{} '{}' differs in {:?}", kind, key, changed);
        reporter.record_fields(&changed);
        let payload = wrap(kind, document);
        self.mutate(Method::Put, &path, Some(payload), Outcome::Updated, reporter)
            .await
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
        outcome: Outcome,
        reporter: &mut OutcomeReporter,
    ) -> Result<Outcome> {
        reporter.record_request(method, path, payload.as_ref());

        if self.options.preview {
            info!("Preview: would send {} {}", method, path);
            return Ok(outcome);
        }

        info!("{} {}", method, path);
        let response = self.client.apply(method, path, payload.as_ref()).await?;
        reporter.record_response(&response);

        if self.options.require_confirmation && method != Method::Delete && response.body.is_none() {
            return Err(Error::Decode {
                method,
                path: path.to_string(),
                message: "response carried no structured document".to_string(),
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::resources::*;
    use nfvis_common::ResourceKind;
    use serde_json::json;

    fn bridges(entries: Value) -> Option<Value> {
        Some(json!({"network:bridges": {"bridge": entries}}))
    }

    fn bridge(name: &str, ports: &[&str]) -> BridgeSpec {
        BridgeSpec {
            name: name.into(),
            ports: Some(ports.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    async fn reconcile<P: MergePolicy>(
        client: &MockClient,
        spec: &P::Spec,
        state: State,
    ) -> std::result::Result<Report, Failure> {
        Reconciler::<_, P>::new(client, ReconcileOptions::default())
            .reconcile(spec, state)
            .await
    }

    #[tokio::test]
    async fn test_converged_bridge_is_unchanged() {
        let client = MockClient::new(bridges(json!([
            {"name": "lan-br", "port": [{"name": "a"}, {"name": "b"}]}
        ])));

        let report = reconcile::<BridgePolicy>(&client, &bridge("lan-br", &["a"]), State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Unchanged);
        assert!(!report.changed);
        assert!(client.mutations().is_empty());
        assert_eq!(report.current.unwrap()["name"], "lan-br");
    }

    #[tokio::test]
    async fn test_missing_port_added_without_removing_others() {
        let client = MockClient::new(bridges(json!([
            {"name": "lan-br", "port": [{"name": "a"}, {"name": "b"}]}
        ])));

        let report = reconcile::<BridgePolicy>(&client, &bridge("lan-br", &["a", "c"]), State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Updated);
        assert_eq!(report.changed_fields, vec!["ports".to_string()]);

        let sent = client.mutations();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].path, "/config/bridges/bridge/lan-br");
        assert_eq!(
            sent[0].body.as_ref().unwrap()["bridge"]["port"],
            json!([{"name": "a"}, {"name": "b"}, {"name": "c"}])
        );
    }

    #[tokio::test]
    async fn test_absent_key_is_created_from_fresh_document() {
        let client = MockClient::new(bridges(json!([{"name": "other-br"}])));

        let report = reconcile::<BridgePolicy>(&client, &bridge("lan-br", &["eth1"]), State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Created);
        assert!(report.current.is_none());
        let sent = client.mutations();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/config/bridges");
        assert_eq!(
            sent[0].body,
            Some(json!({"bridge": {"name": "lan-br", "port": [{"name": "eth1"}]}}))
        );
    }

    #[tokio::test]
    async fn test_empty_collection_creates() {
        let client = MockClient::new(None);
        let spec = VlanSpec { vlan_id: 100 };

        let report = reconcile::<VlanPolicy>(&client, &spec, State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Created);
        let requests = client.requests();
        assert_eq!(requests[0].path, "/running/switch/vlan?deep");
        assert_eq!(requests[0].accept, nfvis_common::MediaType::Collection);
        assert_eq!(requests[1].path, "/running/switch");
        assert_eq!(requests[1].body, Some(json!({"vlan": {"vlan-id": 100}})));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let client = MockClient::new(Some(json!({
            "network:networks": {"network": [
                {"name": "lan-net", "bridge": "lan-br", "trunk": false, "vlan": 10}
            ]}
        })));
        let spec = NetworkSpec {
            name: "lan-net".into(),
            bridge: "lan-br".into(),
            trunk: Some(false),
            vlan: Some("10".into()),
            ..Default::default()
        };

        for _ in 0..2 {
            let report = reconcile::<NetworkPolicy>(&client, &spec, State::Present)
                .await
                .unwrap();
            assert_eq!(report.outcome, Outcome::Unchanged);
        }
        assert!(client.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_ip_fails_before_any_request() {
        let client = MockClient::new(None);
        let spec = BridgeSpec {
            name: "lan-br".into(),
            ip: Some(IpSpec {
                address: Some("10.0.0.1".into()),
                netmask: None,
            }),
            ..Default::default()
        };

        let failure = reconcile::<BridgePolicy>(&client, &spec, State::Present)
            .await
            .unwrap_err();

        assert!(matches!(failure.error, Error::Validation { .. }));
        assert!(failure.report.outcome.is_failed());
        assert!(failure.report.method.is_none());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let client = MockClient::new(None);
        let failure = reconcile::<PackagePolicy>(&client, &PackageSpec::new(""), State::Absent)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, Error::Validation { .. }));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_key_that_would_escape_instance_path_rejected() {
        let client = MockClient::new(bridges(json!([{"name": "lan-br"}])));
        for name in ["lan-br/../wan-br", "lan-br?deep", "lan#br"] {
            let failure = reconcile::<BridgePolicy>(&client, &bridge(name, &[]), State::Absent)
                .await
                .unwrap_err();
            match failure.error {
                Error::Validation { field, .. } => assert_eq!(field, "name"),
                other => panic!("expected validation error, got {other}"),
            }
        }
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_and_absent() {
        let client = MockClient::new(Some(json!({
            "collection": {"switch:vlan": [{"vlan-id": 20}]}
        })));

        let report = reconcile::<VlanPolicy>(&client, &VlanSpec { vlan_id: 20 }, State::Absent)
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Deleted);
        assert_eq!(report.path.as_deref(), Some("/running/switch/vlan/20"));
        assert_eq!(client.mutations()[0].method, Method::Delete);

        let report = reconcile::<VlanPolicy>(&client, &VlanSpec { vlan_id: 30 }, State::Absent)
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Unchanged);
        assert_eq!(client.mutations().len(), 1);
    }

    #[tokio::test]
    async fn test_no_update_kinds_ignore_differences() {
        let client = MockClient::new(Some(json!({
            "vmlc:images": {"image": [{"name": "asav", "src": "file:///elsewhere/asav.tar.gz"}]}
        })));
        let report = reconcile::<PackagePolicy>(&client, &PackageSpec::new("asav"), State::Present)
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Unchanged);

        let client = MockClient::new(Some(json!({
            "vmlc:deployments": {"deployment": [{"name": "asav-1", "vm_group": {"flavor": "ASAv10"}}]}
        })));
        let spec = DeploymentSpec::new("asav-1", "asav", "ASAv5");
        let report = reconcile::<DeploymentPolicy>(&client, &spec, State::Present)
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Unchanged);
        assert!(client.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_preview_predicts_without_mutating() {
        let client = MockClient::new(bridges(json!([{"name": "lan-br", "port": [{"name": "a"}]}])));
        let options = ReconcileOptions {
            preview: true,
            ..Default::default()
        };

        let report = Reconciler::<_, BridgePolicy>::new(&client, options)
            .reconcile(&bridge("lan-br", &["b"]), State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Updated);
        assert!(report.preview);
        assert_eq!(report.method, Some(Method::Put));
        assert!(report.payload.is_some());
        assert!(report.status.is_none());
        assert!(client.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_protocol_failure_reports_last_request() {
        let client = MockClient::new(None).with_apply(400, Some(json!({"errors": "bad"})));

        let failure = reconcile::<BridgePolicy>(&client, &bridge("lan-br", &["eth9"]), State::Present)
            .await
            .unwrap_err();

        assert_eq!(failure.error.status(), Some(400));
        let report = failure.report;
        assert!(matches!(report.outcome, Outcome::Failed(_)));
        assert_eq!(report.method, Some(Method::Post));
        assert_eq!(report.path.as_deref(), Some("/config/bridges"));
        assert!(report.payload.is_some());
        assert_eq!(report.status, Some(400));
        assert_eq!(report.response, Some(json!({"errors": "bad"})));
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_get() {
        let client = MockClient::new(None).with_fetch_status(500);
        let failure = reconcile::<NetworkPolicy>(
            &client,
            &NetworkSpec {
                name: "n".into(),
                bridge: "b".into(),
                ..Default::default()
            },
            State::Present,
        )
        .await
        .unwrap_err();

        assert_eq!(failure.report.method, Some(Method::Get));
        assert_eq!(failure.report.path.as_deref(), Some("/config/networks?deep"));
        assert_eq!(failure.report.status, Some(500));
    }

    #[tokio::test]
    async fn test_confirmation_requires_response_document() {
        let client = MockClient::new(None).with_apply(201, None);
        let options = ReconcileOptions {
            require_confirmation: true,
            ..Default::default()
        };

        let failure = Reconciler::<_, PackagePolicy>::new(&client, options)
            .reconcile(&PackageSpec::new("asav"), State::Present)
            .await
            .unwrap_err();

        assert!(matches!(failure.error, Error::Decode { method: Method::Post, .. }));
        assert_eq!(failure.report.status, Some(201));
    }

    #[tokio::test]
    async fn test_purge_replaces_existing_bridge() {
        let client = MockClient::new(bridges(json!([
            {"name": "lan-br", "port": [{"name": "old"}], "vlan": 5}
        ])));
        let spec = BridgeSpec {
            purge: true,
            ..bridge("lan-br", &["new"])
        };

        let report = reconcile::<BridgePolicy>(&client, &spec, State::Present)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Updated);
        let sent = client.mutations();
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(
            sent[0].body,
            Some(json!({"bridge": {"name": "lan-br", "port": [{"name": "new"}]}}))
        );
    }

    #[tokio::test]
    async fn test_system_settings_update_and_limits() {
        let client = MockClient::new(Some(json!({
            "system:settings": {"hostname": "nfvis", "trusted-source": ["10.0.0.0/8"]}
        })));
        let spec = SystemSpec {
            hostname: Some("branch-01".into()),
            trusted_source: None,
        };

        let report = reconcile::<SystemPolicy>(&client, &spec, State::Present)
            .await
            .unwrap();
        assert_eq!(report.key, "settings");
        assert_eq!(report.outcome, Outcome::Updated);
        let sent = client.mutations();
        assert_eq!(sent[0].path, "/config/system/settings");
        assert_eq!(sent[0].body.as_ref().unwrap()["settings"]["hostname"], "branch-01");

        let failure = reconcile::<SystemPolicy>(&client, &spec, State::Absent)
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            Error::Unsupported {
                kind: ResourceKind::SystemSettings,
                operation: "delete"
            }
        ));

        let empty = MockClient::new(None);
        let failure = reconcile::<SystemPolicy>(&empty, &spec, State::Present)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, Error::Unsupported { operation: "create", .. }));
        assert!(empty.mutations().is_empty());
    }
}
