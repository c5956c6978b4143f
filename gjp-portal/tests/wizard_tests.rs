//! Submission wizard integration tests
//!
//! Drive the wizard, draft store and submission gateway together against an
//! in-process backend.

mod helpers;

use gjp_common::events::PortalEvent;
use gjp_common::FileStore;
use gjp_portal::drafts::DraftKey;
use gjp_portal::gateway::GatewayError;
use gjp_portal::models::{Contributor, ContributorList, SubmissionDetails, UploadedFile};
use gjp_portal::validation::assess_readiness;
use gjp_portal::{Portal, PortalError, Route, SessionError, WizardStep};
use helpers::{fast_retry, memory_portal, valid_token, write_manuscript, ScriptedBackend};
use std::sync::Arc;

/// Walk all four steps with valid input, ending on Review
async fn complete_steps(portal: &Portal, notes: &str) {
    let dir = tempfile::tempdir().unwrap();
    let manuscript = write_manuscript(dir.path(), "Soil.docx");
    let gateway = portal.submissions();
    let mut wizard = portal.wizard();

    wizard.set_details(
        SubmissionDetails::new("Soil Stabilization", "Lime treatment of expansive clay")
            .with_keywords("soil, lime"),
    );
    assert_eq!(wizard.continue_step().unwrap(), WizardStep::Files);

    wizard.upload(&gateway, &manuscript).await.unwrap();
    assert_eq!(wizard.continue_step().unwrap(), WizardStep::Contributors);

    wizard
        .contributors_mut()
        .add(Contributor::new("A", "a@x.com"));
    assert_eq!(wizard.continue_step().unwrap(), WizardStep::EditorNotes);

    wizard.set_editor_notes(notes);
    assert_eq!(wizard.continue_step().unwrap(), WizardStep::Review);
}

#[tokio::test]
async fn test_complete_flow_is_ready_and_submits() {
    // Given: a logged-in user who completed every step
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "Please consider for the special issue").await;

    let mut events = portal.events().subscribe();
    let mut wizard = portal.wizard();
    assert_eq!(wizard.step(), WizardStep::Review);

    // When: review then submit
    let report = wizard.review().unwrap();
    assert!(report.is_ready());
    let submitted = wizard.submit(&portal.submissions()).await.unwrap();

    // Then: one backend call, drafts cleared, Submissions is next
    assert_eq!(submitted.report.attempts, 1);
    assert_eq!(submitted.next, Route::Submissions);
    assert_eq!(backend.count("make_submission"), 1);
    assert_eq!(wizard.step(), WizardStep::Details);

    let payload = backend.payloads.lock().unwrap()[0].clone();
    assert_eq!(payload.submitted_by.as_deref(), Some("7"));
    assert_eq!(payload.details.title, "Soil Stabilization");
    assert_eq!(payload.files[0].server_file_name, "u7_Soil.docx");
    assert!(payload.contributors[0].is_primary_contact);
    assert!(payload.submission_id.is_some());

    let drafts = portal.drafts().load_all();
    assert_eq!(drafts, Default::default());

    let mut saw_completion = false;
    while let Ok(event) = events.try_recv() {
        if let PortalEvent::SubmissionCompleted { attempts, .. } = event {
            assert_eq!(attempts, 1);
            saw_completion = true;
        }
    }
    assert!(saw_completion);
}

#[tokio::test]
async fn test_empty_editor_notes_block_submit() {
    // Given: everything but the editor notes
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "").await;

    // When: reviewing with empty notes
    let mut wizard = portal.wizard();
    let report = wizard.review().unwrap();

    // Then: not ready, submit rejected without contacting the backend
    assert!(report.details && report.files && report.contributors);
    assert!(!report.editor_notes);
    let err = wizard.submit(&portal.submissions()).await.unwrap_err();
    assert!(matches!(err, PortalError::NotReady(_)));
    assert_eq!(backend.count("make_submission"), 0);

    // When: notes are filled in
    wizard.enter(WizardStep::EditorNotes).unwrap();
    wizard.set_editor_notes("n");
    wizard.continue_step().unwrap();

    // Then: ready
    assert!(wizard.readiness().unwrap().is_ready());
}

#[tokio::test]
async fn test_any_missing_section_is_not_ready() {
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "notes").await;

    let drafts = portal.drafts();
    let complete = drafts.load_all();
    assert!(assess_readiness(&complete).is_ready());

    let mut no_title = complete.clone();
    no_title.details.title.clear();
    let mut no_abstract = complete.clone();
    no_abstract.details.abstract_text = "   ".to_string();
    let mut no_server_name = complete.clone();
    no_server_name.files[0].server_file_name.clear();
    let mut no_contributors = complete.clone();
    no_contributors.contributors = ContributorList::new();
    let mut bad_email = complete.clone();
    bad_email.contributors = ContributorList::from(vec![Contributor::new("A", "a-at-x")]);

    for broken in [no_title, no_abstract, no_server_name, no_contributors, bad_email] {
        assert!(!assess_readiness(&broken).is_ready());
    }

    // A draft edited behind the wizard's back is caught at submit time
    let mut wizard = portal.wizard();
    wizard.review().unwrap();
    drafts
        .save_step_draft(DraftKey::Files, &Vec::<UploadedFile>::new())
        .unwrap();

    let err = wizard.submit(&portal.submissions()).await.unwrap_err();
    assert!(matches!(err, PortalError::NotReady(ref r) if !r.files));
    assert_eq!(backend.count("make_submission"), 0);
}

#[tokio::test]
async fn test_fails_twice_then_succeeds() {
    // Given: a backend that rejects the first two submissions
    let backend = ScriptedBackend::new();
    backend.script_submit(vec![
        Err(GatewayError::Rejected("Database busy".to_string())),
        Err(GatewayError::Network("connection reset".to_string())),
    ]);
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "notes").await;

    // When
    let mut wizard = portal.wizard();
    let submitted = wizard.submit(&portal.submissions()).await.unwrap();

    // Then: three calls, one success, identical payloads
    assert_eq!(submitted.report.attempts, 3);
    assert_eq!(backend.count("make_submission"), 3);
    let payloads = backend.payloads.lock().unwrap();
    assert!(payloads.iter().all(|p| *p == payloads[0]));
    assert_eq!(portal.drafts().load_all(), Default::default());
}

#[tokio::test]
async fn test_exhausted_retries_keep_drafts() {
    let backend = ScriptedBackend::new();
    backend.script_submit(vec![
        Err(GatewayError::Rejected(String::new())),
        Err(GatewayError::Rejected(String::new())),
        Err(GatewayError::Rejected(String::new())),
    ]);
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "notes").await;
    let before = portal.drafts().load_all();

    let mut wizard = portal.wizard();
    let err = wizard.submit(&portal.submissions()).await.unwrap_err();

    assert!(matches!(err, PortalError::Gateway(GatewayError::Rejected(_))));
    assert_eq!(backend.count("make_submission"), 3);
    assert_eq!(portal.drafts().load_all(), before);
    assert_eq!(wizard.step(), WizardStep::Review);
}

#[tokio::test]
async fn test_auth_rejection_clears_session_without_retry() {
    let backend = ScriptedBackend::new();
    backend.script_submit(vec![Err(GatewayError::AuthRejected {
        status: 401,
        message: "Unauthorized".to_string(),
    })]);
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "notes").await;

    let mut wizard = portal.wizard();
    let err = wizard.submit(&portal.submissions()).await.unwrap_err();

    assert!(err.requires_login());
    assert_eq!(backend.count("make_submission"), 1);
    assert!(!portal.session().is_logged_in());
    assert!(!portal.drafts().load_all().files.is_empty());
}

#[tokio::test]
async fn test_expired_session_never_transmits() {
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&helpers::expired_token()).unwrap();
    let mut gate = portal.gate(
        helpers::RecordingNavigator::default(),
        Default::default(),
        Route::Profile,
    );
    assert!(gate.is_authenticated());

    let err = portal.accounts().profile().await.unwrap_err();

    assert!(matches!(
        err,
        PortalError::Gateway(GatewayError::Session(SessionError::Expired { .. }))
    ));
    assert_eq!(err.user_message(), "Token has expired. Please log in again.");
    assert_eq!(backend.count("get_profile"), 0);

    // The stale token is gone, so the gate now refuses
    assert!(!portal.session().is_logged_in());
    assert!(!gate.process_events());
    assert_eq!(*gate.navigator().routes.lock().unwrap(), vec![Route::Login]);
}

#[tokio::test]
async fn test_cleared_drafts_reload_as_defaults() {
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend);
    portal.session().set_token(&valid_token()).unwrap();
    complete_steps(&portal, "notes").await;

    portal.drafts().clear_all_drafts().unwrap();

    let wizard = portal.wizard();
    assert_eq!(wizard.step(), WizardStep::Details);
    assert_eq!(*wizard.details(), SubmissionDetails::default());
    assert!(wizard.files().is_empty());
    assert!(wizard.contributors().is_empty());
    assert_eq!(wizard.editor_notes(), "");
    assert!(portal.drafts().current_submission_id().is_none());
}

#[tokio::test]
async fn test_contributor_prefill_and_sync() {
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();

    let mut wizard = portal.wizard();
    wizard.set_details(SubmissionDetails::new("T", "A"));
    wizard.continue_step().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_manuscript(dir.path(), "paper.doc");
    wizard.upload(&portal.submissions(), &path).await.unwrap();
    wizard.continue_step().unwrap();

    let profile = portal.accounts().profile().await.unwrap();
    assert!(wizard.prefill_contributor_from_profile(&profile));
    wizard.continue_step().unwrap();
    assert!(wizard.sync_contributors(&portal.submissions()).await.unwrap());

    let synced = backend.synced_contributors.lock().unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(Some(synced[0].0.clone()), portal.drafts().current_submission_id());
    let primary = synced[0].1.primary_contact().unwrap();
    assert_eq!(primary.given_name, "Asha");
    assert_eq!(primary.affiliation, "IIT Delhi");
}

#[tokio::test]
async fn test_rejected_upload_never_reaches_backend() {
    let backend = ScriptedBackend::new();
    let (portal, _) = memory_portal(backend.clone());
    portal.session().set_token(&valid_token()).unwrap();

    let mut wizard = portal.wizard();
    wizard.set_details(SubmissionDetails::new("T", "A"));
    wizard.continue_step().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_manuscript(dir.path(), "paper.pdf");
    let err = wizard.upload(&portal.submissions(), &pdf).await.unwrap_err();

    assert!(matches!(err, PortalError::Validation(_)));
    assert_eq!(err.user_message(), "Only DOC or DOCX files are allowed");
    assert_eq!(backend.count("upload"), 0);
    assert!(wizard.files().is_empty());
}

#[tokio::test]
async fn test_malformed_file_store_drafts_load_defaults() {
    // Given: a file-backed store with corrupt draft files
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    std::fs::write(dir.path().join("submissionDetails.json"), "{\"title\": 12").unwrap();
    std::fs::write(dir.path().join("submissionContributors.json"), "[{]").unwrap();
    std::fs::write(dir.path().join("submissionWizardStep.json"), "contributors").unwrap();

    // When: the wizard is opened over it
    let portal = Portal::with_backend(store, ScriptedBackend::new(), fast_retry());
    let wizard = portal.wizard();

    // Then: defaults, and the unreachable stored step falls back to Details
    assert_eq!(*wizard.details(), SubmissionDetails::default());
    assert!(wizard.contributors().is_empty());
    assert_eq!(wizard.step(), WizardStep::Details);
}
