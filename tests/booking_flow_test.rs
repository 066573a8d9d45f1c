mod common;

use common::{profile, FakeLauncher};
use pitch_booker::core::booking::{
    BookingFlow, BookingSettings, CONTINUE_BUTTON, PAY_BUTTON, SUBMIT_BUTTON, TERMS_CHECKBOX,
};
use pitch_booker::core::CountdownObserver;
use pitch_booker::domain::model::{BookingStage, BookingTarget, ReviewWindow, WaitPhase};
use pitch_booker::{BookingError, CancelToken, LogCountdown};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LINK: &str = "https://booking.example.org/cgi/anmeldung.fcgi?slot=a";

fn target() -> BookingTarget {
    BookingTarget {
        day: "Dienstag".to_string(),
        time_slot: "18:00-19:00".to_string(),
        field: "3".to_string(),
        link: LINK.to_string(),
    }
}

fn flow(launcher: FakeLauncher, review_secs: u64) -> BookingFlow<FakeLauncher> {
    let settings = BookingSettings::new(ReviewWindow::from_secs(review_secs))
        .with_grace_period(Duration::ZERO);
    BookingFlow::new(launcher, profile(), settings, Arc::new(LogCountdown))
}

#[derive(Default)]
struct PhaseRecorder {
    phases: Mutex<Vec<WaitPhase>>,
}

impl CountdownObserver for PhaseRecorder {
    fn on_tick(&self, phase: WaitPhase, _remaining: Duration) {
        self.phases.lock().unwrap().push(phase);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stages_run_in_page_order() {
    let launcher = FakeLauncher::new();
    let log = launcher.log.clone();

    let receipt = flow(launcher, 0)
        .execute(target(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(receipt.target, target());

    let log = log.lock().unwrap();
    let ops = log.op_names();
    let position = |op: &str| {
        ops.iter()
            .position(|o| o == op)
            .unwrap_or_else(|| panic!("missing op {op}"))
    };

    let order = [
        position(&format!("navigate {LINK}")),
        position("check_role radio"),
        position(&format!("click button {CONTINUE_BUTTON}")),
        position(r#"fill input[name="Vorname"]=Erika"#),
        position(r#"fill input[name="Vorname2"]=Max"#),
        position(r#"fill input[name="iban"]=DE02120300000000202051"#),
        position(&format!("check {TERMS_CHECKBOX}")),
        position(&format!("click button {SUBMIT_BUTTON}")),
        position("check_role checkbox"),
        position(&format!("click button {PAY_BUTTON}")),
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "ops out of order: {ops:?}");
    let pay_clicks = ops
        .iter()
        .filter(|o| **o == format!("click button {PAY_BUTTON}"))
        .count();
    assert_eq!(pay_clicks, 1);
    assert_eq!(log.launches, 1);
    assert_eq!(log.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_form_uses_person_suffixes_and_site_codes() {
    let launcher = FakeLauncher::new();
    let log = launcher.log.clone();

    flow(launcher, 0)
        .execute(target(), &CancelToken::new())
        .await
        .unwrap();

    let log = log.lock().unwrap();
    assert!(log.contains(r#"check input[name="Geschlecht"][id="weiblich"]"#));
    assert!(log.contains(r#"check input[name="Geschlecht2"][id="weiblich"]"#));
    assert!(log.contains(r#"fill input[name="Ort"]=01069 Dresden"#));
    assert!(log.contains(r#"select select[name="Statusorig2"]=S-TU"#));
    assert!(log.contains(r#"fill input[name="Geburtsdatum2"]=01.02.2000"#));
    assert!(log.contains(r#"fill input[name="bic"]=BYLADEM1001"#));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_birthdate_is_skipped() {
    let launcher = FakeLauncher::new().without_birthdate();
    let log = launcher.log.clone();

    flow(launcher, 0)
        .execute(target(), &CancelToken::new())
        .await
        .unwrap();

    let log = log.lock().unwrap();
    assert!(!log.op_names().iter().any(|op| op.contains("Geburtsdatum")));
    assert!(log.contains(&format!("click button {PAY_BUTTON}")));
}

#[tokio::test(start_paused = true)]
async fn test_pay_click_waits_for_review_window() {
    let launcher = FakeLauncher::new();
    let log = launcher.log.clone();
    let recorder = Arc::new(PhaseRecorder::default());
    let settings =
        BookingSettings::new(ReviewWindow::from_secs(5)).with_grace_period(Duration::ZERO);
    let flow = BookingFlow::new(launcher, profile(), settings, recorder.clone());

    flow.execute(target(), &CancelToken::new()).await.unwrap();

    let log = log.lock().unwrap();
    let confirm_entered = log.time_of("check_role checkbox").unwrap();
    let paid = log.time_of(&format!("click button {PAY_BUTTON}")).unwrap();
    let waited = paid - confirm_entered;
    assert!(waited >= Duration::from_secs(5));
    assert!(waited < Duration::from_secs(6));

    let phases = recorder.phases.lock().unwrap();
    assert_eq!(phases.len(), 5);
    assert!(phases.iter().all(|p| *p == WaitPhase::Review));
}

#[tokio::test(start_paused = true)]
async fn test_grace_period_keeps_browser_open_after_booking() {
    let launcher = FakeLauncher::new();
    let log = launcher.log.clone();
    let settings =
        BookingSettings::new(ReviewWindow::from_secs(0)).with_grace_period(Duration::from_secs(3));
    let flow = BookingFlow::new(launcher, profile(), settings, Arc::new(LogCountdown));

    let start = tokio::time::Instant::now();
    flow.execute(target(), &CancelToken::new()).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(log.lock().unwrap().closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_element_aborts_with_form_mismatch_and_closes() {
    let launcher = FakeLauncher::new().with_missing(r#"input[name="iban"]"#);
    let log = launcher.log.clone();

    let result = flow(launcher, 0).execute(target(), &CancelToken::new()).await;

    match result {
        Err(BookingError::FormMismatch { stage, detail }) => {
            assert_eq!(stage, BookingStage::FillForm);
            assert!(detail.contains("iban"));
        }
        other => panic!("expected FormMismatch, got {other:?}"),
    }

    let log = log.lock().unwrap();
    assert!(!log.contains(&format!("click button {SUBMIT_BUTTON}")));
    assert!(!log.contains(&format!("click button {PAY_BUTTON}")));
    assert_eq!(log.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_failure_does_not_hide_outcome() {
    let launcher = FakeLauncher::new().failing_close();
    let log = launcher.log.clone();
    let receipt = flow(launcher, 0)
        .execute(target(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(receipt.target, target());

    let launcher = FakeLauncher::new()
        .failing_close()
        .with_missing(r#"input[name="bic"]"#);
    let result = flow(launcher, 0).execute(target(), &CancelToken::new()).await;
    assert!(matches!(result, Err(BookingError::FormMismatch { .. })));

    assert_eq!(log.lock().unwrap().closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_slot_radio_fails_in_select_stage() {
    let launcher = FakeLauncher::new().with_missing("radio");

    let result = flow(launcher, 0).execute(target(), &CancelToken::new()).await;

    assert!(matches!(
        result,
        Err(BookingError::FormMismatch {
            stage: BookingStage::SelectSlot,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_review_never_pays() {
    let launcher = FakeLauncher::new();
    let log = launcher.log.clone();
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        trigger.cancel();
    });

    let start = tokio::time::Instant::now();
    let result = flow(launcher, 30).execute(target(), &cancel).await;

    assert!(matches!(result, Err(BookingError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(30));

    let log = log.lock().unwrap();
    assert!(log.contains("check_role checkbox"));
    assert!(!log.contains(&format!("click button {PAY_BUTTON}")));
    assert_eq!(log.closed, 1);
}

#[tokio::test]
async fn test_launch_failure_is_reported() {
    let launcher = FakeLauncher::new().failing();
    let log = launcher.log.clone();

    let result = flow(launcher, 0).execute(target(), &CancelToken::new()).await;

    assert!(matches!(result, Err(BookingError::Browser { .. })));
    assert_eq!(log.lock().unwrap().closed, 0);
}
