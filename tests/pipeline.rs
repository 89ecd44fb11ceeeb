// ABOUTME: End-to-end tests for the promotion pipeline against stub
// ABOUTME: collaborators: stage ordering, aborts, policies, and history.

mod support;

use std::time::Duration;

use stevedore::commands::deploy::run_promotion;
use stevedore::deploy::{
    CancelSignal, ConvergenceError, DeployError, ExternalImagePolicy, PromotionRequest,
    TransformError, WaitOptions,
};
use stevedore::history::HistoryStore;
use stevedore::notify::Severity;
use stevedore::platform::{
    ContainerDef, RevisionRef, RevisionSelector, ServiceRuntimeState, ServiceSpec,
};
use stevedore::types::{ImageOption, ImageOptions, RegistryScope};

use support::{MemHistory, RecordingSink, RolloutBehavior, StubPlatform, StubRegistry};

const ECR_HOST: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com";

fn container(name: &str, image: &str) -> ContainerDef {
    ContainerDef {
        name: name.to_string(),
        image: image.to_string(),
        extra: serde_json::Map::new(),
    }
}

fn web_spec() -> ServiceSpec {
    ServiceSpec {
        family: "web".into(),
        container_defs: vec![
            container("web", &format!("{ECR_HOST}/app:v1")),
            container("sidecar", "public.example/proxy:latest"),
        ],
        cpu: Some("256".into()),
        memory: Some("512".into()),
        network_mode: None,
        execution_role_arn: None,
        task_role_arn: None,
        volumes: vec![],
        placement_constraints: vec![],
        compatibilities: vec![],
    }
}

fn live_platform() -> StubPlatform {
    let live = ServiceRuntimeState {
        active_revision: "web:3".parse().unwrap(),
        deployment_count: 1,
    };
    let platform = StubPlatform::new(live, 4);
    platform.insert_spec(&"web:3".parse().unwrap(), web_spec());
    platform
}

fn request(policy: ExternalImagePolicy) -> PromotionRequest {
    PromotionRequest {
        cluster: "prod".into(),
        service: "web".into(),
        images: [ImageOption::new("app", "v1").unwrap()].into_iter().collect(),
        scope: RegistryScope::aws_ecr(),
        external_images: policy,
    }
}

fn fast_wait() -> WaitOptions {
    WaitOptions {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn promotion_happy_path() {
    let platform = live_platform();
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let outcome = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.baseline, "web:3".parse::<RevisionRef>().unwrap());
    assert_eq!(outcome.target, "web:4".parse::<RevisionRef>().unwrap());

    // One retag, to the attempt's tag, in the option's repository.
    let tag = outcome.attempt_id.as_tag();
    assert_eq!(registry.put_calls(), vec![("app".to_string(), tag.clone())]);
    // The retagged manifest is byte-identical to the source.
    assert_eq!(
        registry.manifest("app", &tag).unwrap(),
        registry.manifest("app", "v1").unwrap()
    );

    // The registered spec pins the attempt tag and drops the sidecar.
    let registered = platform.registered_specs();
    assert_eq!(registered.len(), 1);
    let containers = &registered[0].spec.container_defs;
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].image, format!("{ECR_HOST}/app:{tag}"));

    // Exactly one cut-over, to the assigned revision.
    assert_eq!(
        platform.update_calls(),
        vec![("prod".to_string(), "web".to_string(), outcome.target.clone())]
    );

    // History names both revisions and the attempt id.
    let entry = history.latest("prod", "web").await.unwrap().unwrap();
    assert_eq!(entry.revision, 4);
    assert!(entry.message.contains("revision 3 -> 4"), "{}", entry.message);
    assert!(entry.message.contains(&outcome.attempt_id.to_string()));

    // The sink heard the cut-over announcement and the final success.
    let messages = sink.messages();
    assert!(
        messages
            .iter()
            .any(|(s, m)| *s == Severity::Info && m.contains("deploy: revision 3 -> 4"))
    );
    assert!(messages.iter().any(|(s, _)| *s == Severity::Good));
}

#[tokio::test]
async fn keep_external_passes_sidecar_through() {
    let platform = live_platform();
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Keep),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    let registered = platform.registered_specs();
    let containers = &registered[0].spec.container_defs;
    assert_eq!(containers.len(), 2);
    assert_eq!(containers[1].image, "public.example/proxy:latest");
    // Still only the in-scope image was retagged.
    assert_eq!(registry.put_calls().len(), 1);
}

#[tokio::test]
async fn in_flight_deployment_aborts_with_no_side_effects() {
    let live = ServiceRuntimeState {
        active_revision: "web:3".parse().unwrap(),
        deployment_count: 2,
    };
    let platform = StubPlatform::new(live, 4);
    platform.insert_spec(&"web:3".parse().unwrap(), web_spec());
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::AlreadyDeploying { deployments: 2, .. }
    ));
    assert!(registry.put_calls().is_empty());
    assert!(platform.registered_specs().is_empty());
    assert!(platform.update_calls().is_empty());
    assert!(history.entries_for("prod", "web").is_empty());
}

#[tokio::test]
async fn missing_image_option_aborts_before_registry_writes() {
    let platform = live_platform();
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let mut req = request(ExternalImagePolicy::Drop);
    req.images = ImageOptions::default();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        req,
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Transform(TransformError::MissingImageOption(ref repo)) if repo == "app"
    ));
    assert!(registry.put_calls().is_empty());
    assert!(platform.registered_specs().is_empty());
}

#[tokio::test]
async fn retag_failure_aborts_before_registration() {
    let platform = live_platform();
    let registry = StubRegistry::default(); // app:v1 does not exist
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::Registry(_)));
    assert!(platform.registered_specs().is_empty());
    assert!(platform.update_calls().is_empty());
    assert!(history.entries_for("prod", "web").is_empty());
}

#[tokio::test]
async fn convergence_timeout_leaves_cutover_standing_and_no_history() {
    let platform = live_platform().with_behavior(RolloutBehavior::NeverConverge);
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        WaitOptions {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
        },
        CancelSignal::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Convergence(ConvergenceError::Timeout(_))
    ));
    // The cut-over was issued and is not rolled back.
    assert_eq!(platform.update_calls().len(), 1);
    // Nothing recorded: the service never reached the target.
    assert!(history.entries_for("prod", "web").is_empty());
}

#[tokio::test]
async fn transient_describe_failures_are_retried_through() {
    let platform = live_platform().with_behavior(RolloutBehavior::FlakyThenConverge(3));
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let outcome = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    // The flaky describes were outlasted and the promotion still recorded.
    let entry = history.latest("prod", "web").await.unwrap().unwrap();
    assert_eq!(entry.revision, outcome.target.revision());
}

#[tokio::test]
async fn definitive_platform_failure_aborts_the_wait() {
    let platform = live_platform().with_behavior(RolloutBehavior::FailDefinitively);
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        // Long deadline: a definitive failure must not wait it out.
        WaitOptions {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(60),
        },
        CancelSignal::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Convergence(ConvergenceError::PlatformFailure(_))
    ));
    assert!(history.entries_for("prod", "web").is_empty());
}

#[tokio::test]
async fn cancellation_stops_the_wait() {
    let platform = live_platform().with_behavior(RolloutBehavior::NeverConverge);
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let (handle, cancel) = CancelSignal::channel();
    handle.cancel();

    let err = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        WaitOptions {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(60),
        },
        cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Convergence(ConvergenceError::Cancelled)
    ));
    assert!(history.entries_for("prod", "web").is_empty());
}

#[tokio::test]
async fn explicit_revision_selects_an_older_baseline() {
    let platform = live_platform();
    let mut old_spec = web_spec();
    old_spec.container_defs[0].image = format!("{ECR_HOST}/app:v0");
    platform.insert_spec(&"web:2".parse().unwrap(), old_spec);
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let outcome = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Number(2),
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.baseline, "web:2".parse::<RevisionRef>().unwrap());
    let entry = history.latest("prod", "web").await.unwrap().unwrap();
    assert!(entry.message.contains("revision 2 -> 4"), "{}", entry.message);
}

#[tokio::test]
async fn successive_promotions_use_fresh_tags_and_stack_history() {
    let platform = live_platform();
    let registry = StubRegistry::seeded(&[("app", "v1")]);
    let history = MemHistory::default();
    let sink = RecordingSink::default();

    let first = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    let second = run_promotion(
        &platform,
        &registry,
        &history,
        &sink,
        request(ExternalImagePolicy::Drop),
        RevisionSelector::Live,
        fast_wait(),
        CancelSignal::never(),
    )
    .await
    .unwrap();

    assert_ne!(first.attempt_id, second.attempt_id);
    assert_eq!(second.baseline, first.target);
    assert_eq!(second.target.revision(), 5);

    let entries = history.entries_for("prod", "web");
    assert_eq!(entries.len(), 2);
    let latest = history.latest("prod", "web").await.unwrap().unwrap();
    assert_eq!(latest.revision, 5);
}
