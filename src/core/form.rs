use super::api_client::ScoringClient;
use super::errors::CoreError;
use super::models::{AnalysisResult, UploadCandidate, PDF_MIME};
use super::render::{Dashboard, DashboardSurface, ResultsRenderer};

pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// The trimmed offer must be strictly longer than this.
pub const MIN_OFFER_CHARS: usize = 50;

pub const SUBMIT_LABEL: &str = "Analyze Compatibility";
pub const BUSY_LABEL: &str = "Analyzing...";

/// Host side of the upload form.
pub trait FormView {
    /// Blocking message to the user.
    fn alert(&mut self, message: &str);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn set_submit_label(&mut self, label: &str);
    fn show_file_info(&mut self, text: &str);
    fn set_drop_zone_active(&mut self, active: bool);
    fn open_file_picker(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEventKind {
    Enter,
    Over,
    Leave,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    DropZone,
    Body,
}

#[derive(Debug, Clone)]
pub struct DragEvent {
    pub kind: DragEventKind,
    pub target: DragTarget,
    pub files: Vec<UploadCandidate>,
}

impl DragEvent {
    pub fn new(kind: DragEventKind, target: DragTarget) -> Self {
        Self {
            kind,
            target,
            files: Vec::new(),
        }
    }

    pub fn drop_files(target: DragTarget, files: Vec<UploadCandidate>) -> Self {
        Self {
            kind: DragEventKind::Drop,
            target,
            files,
        }
    }
}

/// What the host must do with the native event after the controller saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDisposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventDisposition {
    const SUPPRESS: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Submit was not enabled; nothing happened.
    Ignored,
    Rendered {
        result: Box<AnalysisResult>,
        dashboard: Box<Dashboard>,
    },
    Failed(CoreError),
}

pub struct FormController<V: FormView> {
    view: V,
    renderer: ResultsRenderer,
    uploaded_file: Option<UploadCandidate>,
    job_offer: String,
    busy: bool,
    drop_zone_active: bool,
}

impl<V: FormView> FormController<V> {
    pub fn new(mut view: V) -> Self {
        view.set_submit_label(SUBMIT_LABEL);
        view.set_submit_enabled(false);

        Self {
            view,
            renderer: ResultsRenderer::new(),
            uploaded_file: None,
            job_offer: String::new(),
            busy: false,
            drop_zone_active: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn uploaded_file(&self) -> Option<&UploadCandidate> {
        self.uploaded_file.as_ref()
    }

    pub fn job_offer(&self) -> &str {
        &self.job_offer
    }

    pub fn is_drop_zone_active(&self) -> bool {
        self.drop_zone_active
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validates and stores a picked file. On rejection the previous file stays.
    pub fn handle_file(&mut self, file: UploadCandidate) -> Result<(), CoreError> {
        if let Err(err) = validate_file(&file) {
            tracing::info!(file = %file.name, reason = %err, "file rejected");
            self.view.alert(&err.to_string());
            return Err(err);
        }

        self.view.show_file_info(&format!(
            "{} ({})",
            file.name,
            format_file_size(file.size)
        ));
        tracing::debug!(file = %file.name, size = file.size, "file selected");
        self.uploaded_file = Some(file);

        self.check_form_ready();
        Ok(())
    }

    /// Input-change handler for the job offer text.
    pub fn set_job_offer(&mut self, text: impl Into<String>) {
        self.job_offer = text.into();
        self.check_form_ready();
    }

    pub fn handle_drag(&mut self, event: DragEvent) -> EventDisposition {
        if event.target == DragTarget::DropZone {
            match event.kind {
                DragEventKind::Enter | DragEventKind::Over => self.set_drop_zone_active(true),
                DragEventKind::Leave | DragEventKind::Drop => self.set_drop_zone_active(false),
            }

            if event.kind == DragEventKind::Drop {
                if let Some(file) = event.files.into_iter().next() {
                    // rejection is already reported through the view
                    let _ = self.handle_file(file);
                }
            }
        }

        EventDisposition::SUPPRESS
    }

    pub fn handle_drop_zone_click(&mut self) {
        self.view.open_file_picker();
    }

    /// File-picker change handler; only the first file is used.
    pub fn handle_picker_selection(&mut self, files: Vec<UploadCandidate>) {
        if let Some(file) = files.into_iter().next() {
            let _ = self.handle_file(file);
        }
    }

    /// First unmet precondition for submitting, if any.
    pub fn readiness(&self) -> Result<(), CoreError> {
        if self.uploaded_file.is_none() {
            return Err(CoreError::MissingFile);
        }

        if !offer_is_long_enough(&self.job_offer) {
            return Err(CoreError::OfferTooShort {
                min: MIN_OFFER_CHARS,
            });
        }

        Ok(())
    }

    pub fn is_submit_enabled(&self) -> bool {
        !self.busy && self.readiness().is_ok()
    }

    pub async fn submit(&mut self, client: &ScoringClient) -> SubmitOutcome
    where
        V: DashboardSurface,
    {
        if !self.is_submit_enabled() {
            return SubmitOutcome::Ignored;
        }
        let Some(file) = self.uploaded_file.as_ref() else {
            return SubmitOutcome::Ignored;
        };

        self.busy = true;
        self.view.set_submit_label(BUSY_LABEL);
        self.view.set_submit_enabled(false);

        let outcome = match client.analyze(file, &self.job_offer).await {
            Ok(response) => {
                let result = response.data;
                let dashboard = self.renderer.render(&result);
                tracing::info!(
                    total_score = result.match_result.total_score,
                    "analysis completed"
                );
                self.view.present(&result, &dashboard);
                SubmitOutcome::Rendered {
                    result: Box::new(result),
                    dashboard: Box::new(dashboard),
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "analysis failed");
                self.view.alert(&format!("Error: {err}"));
                SubmitOutcome::Failed(err)
            }
        };

        self.busy = false;
        self.view.set_submit_label(SUBMIT_LABEL);
        self.check_form_ready();
        outcome
    }

    fn set_drop_zone_active(&mut self, active: bool) {
        if self.drop_zone_active != active {
            self.drop_zone_active = active;
            self.view.set_drop_zone_active(active);
        }
    }

    fn check_form_ready(&mut self) {
        let enabled = self.is_submit_enabled();
        self.view.set_submit_enabled(enabled);
    }
}

pub fn validate_file(file: &UploadCandidate) -> Result<(), CoreError> {
    if file.media_type != PDF_MIME {
        return Err(CoreError::UnsupportedFileType {
            media_type: file.media_type.clone(),
        });
    }

    if file.size > MAX_FILE_SIZE {
        return Err(CoreError::FileTooLarge { size: file.size });
    }

    Ok(())
}

pub fn offer_is_long_enough(text: &str) -> bool {
    text.trim().chars().count() > MIN_OFFER_CHARS
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["Bytes", "KB", "MB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut index = 0;
    let mut unit = 1u64;
    while index < UNITS.len() - 1 && bytes >= unit * 1024 {
        unit *= 1024;
        index += 1;
    }

    let value = (bytes as f64 / unit as f64 * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[index])
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use reqwest::Client;
    use serde_json::json;

    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::core::models::RuntimeSettings;
    use crate::core::render::{DeferredEffect, EXCELLENT_MATCH, SUCCESS_COLOR};
    use crate::core::test_support::{sample_payload, spawn_backend};

    #[derive(Default)]
    struct FakeView {
        alerts: Vec<String>,
        submit_enabled: bool,
        submit_label: String,
        file_info: Option<String>,
        drop_zone_active: bool,
        picker_opened: usize,
        presented: Vec<String>,
    }

    impl FormView for FakeView {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn set_submit_enabled(&mut self, enabled: bool) {
            self.submit_enabled = enabled;
        }

        fn set_submit_label(&mut self, label: &str) {
            self.submit_label = label.to_string();
        }

        fn show_file_info(&mut self, text: &str) {
            self.file_info = Some(text.to_string());
        }

        fn set_drop_zone_active(&mut self, active: bool) {
            self.drop_zone_active = active;
        }

        fn open_file_picker(&mut self) {
            self.picker_opened += 1;
        }
    }

    impl DashboardSurface for FakeView {
        fn present(&mut self, _result: &AnalysisResult, dashboard: &Dashboard) {
            self.presented.push(dashboard.gauge.description.to_string());
        }

        fn apply_effect(&mut self, _effect: DeferredEffect) {}
    }

    fn pdf(name: &str, size: usize) -> UploadCandidate {
        UploadCandidate::new(name, PDF_MIME, vec![0u8; size])
    }

    fn offer(len: usize) -> String {
        "a".repeat(len)
    }

    fn client_for(base_url: &str) -> ScoringClient {
        let settings = RuntimeSettings {
            service_url: base_url.to_string(),
            api_prefix: "/api".to_string(),
        };
        ScoringClient::new(Client::new(), &settings).unwrap()
    }

    #[test]
    fn format_file_size_uses_binary_units() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(2_621_440), "2.5 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn non_pdf_is_rejected_and_prior_file_kept() {
        let mut form = FormController::new(FakeView::default());
        form.handle_file(pdf("first.pdf", 100)).unwrap();

        let docx = UploadCandidate::new("cv.docx", "application/msword", vec![0u8; 10]);
        let err = form.handle_file(docx).unwrap_err();

        assert!(matches!(err, CoreError::UnsupportedFileType { .. }));
        assert_eq!(form.uploaded_file().unwrap().name, "first.pdf");
        assert_eq!(form.view().alerts, vec!["Please upload PDF files only"]);
    }

    #[test]
    fn oversized_file_is_rejected_regardless_of_type() {
        let mut form = FormController::new(FakeView::default());

        let err = form
            .handle_file(pdf("big.pdf", MAX_FILE_SIZE as usize + 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(form.uploaded_file().is_none());
        assert_eq!(form.view().alerts, vec!["The file is too large. Maximum 5MB"]);

        assert!(form.handle_file(pdf("limit.pdf", MAX_FILE_SIZE as usize)).is_ok());
    }

    #[test]
    fn accepted_file_shows_name_and_size() {
        let mut form = FormController::new(FakeView::default());
        form.handle_file(pdf("resume.pdf", 2048)).unwrap();

        assert_eq!(form.view().file_info.as_deref(), Some("resume.pdf (2 KB)"));
        assert!(form.view().alerts.is_empty());
    }

    #[test]
    fn submit_enabled_iff_file_and_long_offer() {
        let mut form = FormController::new(FakeView::default());
        assert!(!form.view().submit_enabled);
        assert_eq!(form.view().submit_label, SUBMIT_LABEL);

        form.set_job_offer(offer(60));
        assert!(!form.is_submit_enabled());
        assert!(matches!(form.readiness(), Err(CoreError::MissingFile)));

        form.handle_file(pdf("cv.pdf", 10)).unwrap();
        assert!(form.view().submit_enabled);

        form.set_job_offer(format!("   {}   ", offer(50)));
        assert!(!form.view().submit_enabled);
        assert!(matches!(
            form.readiness(),
            Err(CoreError::OfferTooShort { min: 50 })
        ));

        form.set_job_offer(offer(51));
        assert!(form.view().submit_enabled);
    }

    #[test]
    fn drop_zone_events_toggle_affordance_and_suppress_defaults() {
        let mut form = FormController::new(FakeView::default());

        let disposition =
            form.handle_drag(DragEvent::new(DragEventKind::Enter, DragTarget::DropZone));
        assert!(disposition.prevent_default && disposition.stop_propagation);
        assert!(form.is_drop_zone_active());
        assert!(form.view().drop_zone_active);

        form.handle_drag(DragEvent::new(DragEventKind::Over, DragTarget::DropZone));
        assert!(form.is_drop_zone_active());

        form.handle_drag(DragEvent::new(DragEventKind::Leave, DragTarget::DropZone));
        assert!(!form.view().drop_zone_active);

        let body = form.handle_drag(DragEvent::new(DragEventKind::Over, DragTarget::Body));
        assert!(body.prevent_default && body.stop_propagation);
        assert!(!form.is_drop_zone_active());
    }

    #[test]
    fn drop_hands_first_file_to_validation() {
        let mut form = FormController::new(FakeView::default());
        form.handle_drag(DragEvent::new(DragEventKind::Enter, DragTarget::DropZone));

        form.handle_drag(DragEvent::drop_files(
            DragTarget::DropZone,
            vec![pdf("dropped.pdf", 10), pdf("ignored.pdf", 10)],
        ));

        assert!(!form.is_drop_zone_active());
        assert_eq!(form.uploaded_file().unwrap().name, "dropped.pdf");

        form.handle_drag(DragEvent::drop_files(
            DragTarget::Body,
            vec![pdf("outside.pdf", 10)],
        ));
        assert_eq!(form.uploaded_file().unwrap().name, "dropped.pdf");
    }

    #[test]
    fn click_opens_picker_and_selection_is_validated() {
        let mut form = FormController::new(FakeView::default());
        form.handle_drop_zone_click();
        assert_eq!(form.view().picker_opened, 1);

        form.handle_picker_selection(vec![UploadCandidate::new(
            "notes.txt",
            "text/plain",
            vec![0u8; 4],
        )]);
        assert!(form.uploaded_file().is_none());

        form.handle_picker_selection(Vec::new());
        assert_eq!(form.view().alerts.len(), 1);
    }

    #[tokio::test]
    async fn submit_is_ignored_when_not_ready() {
        let backend = spawn_backend(StatusCode::OK, sample_payload(85.0)).await;
        let client = client_for(&backend.base_url);
        let mut form = FormController::new(FakeView::default());
        form.set_job_offer(offer(80));

        let outcome = form.submit(&client).await;
        assert!(matches!(outcome, SubmitOutcome::Ignored));
        assert_eq!(backend.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn end_to_end_upload_and_render() {
        let backend = spawn_backend(StatusCode::OK, sample_payload(85.0)).await;
        let client = client_for(&backend.base_url);
        let mut form = FormController::new(FakeView::default());

        form.handle_file(pdf("cv.pdf", 2 * 1024 * 1024)).unwrap();
        form.set_job_offer(offer(60));
        assert!(form.view().submit_enabled);

        let outcome = form.submit(&client).await;

        assert_eq!(backend.analyze_calls(), 1);
        let received = backend.last_form().unwrap();
        assert_eq!(received.cv_len, 2 * 1024 * 1024);
        assert_eq!(received.job_offer.as_deref(), Some(offer(60).as_str()));

        let SubmitOutcome::Rendered { dashboard, .. } = outcome else {
            panic!("expected rendered outcome");
        };
        assert_eq!(dashboard.gauge.description, EXCELLENT_MATCH);
        assert_eq!(dashboard.gauge.stroke_color, SUCCESS_COLOR);
        assert_eq!(form.view().presented, vec![EXCELLENT_MATCH.to_string()]);

        assert_eq!(form.view().submit_label, SUBMIT_LABEL);
        assert!(form.view().submit_enabled);
        assert!(!form.is_busy());
    }

    #[tokio::test]
    async fn server_failure_alerts_and_restores_form() {
        let backend = spawn_backend(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"detail": "Could not read the PDF"}),
        )
        .await;
        let client = client_for(&backend.base_url);
        let mut form = FormController::new(FakeView::default());
        form.handle_file(pdf("cv.pdf", 100)).unwrap();
        form.set_job_offer(offer(70));

        let outcome = form.submit(&client).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(CoreError::Server { .. })));
        assert_eq!(form.view().alerts, vec!["Error: Could not read the PDF"]);
        assert!(form.view().presented.is_empty());
        assert_eq!(form.view().submit_label, SUBMIT_LABEL);
        assert!(form.view().submit_enabled);
    }

    #[tokio::test]
    async fn unreachable_service_alerts_and_restores_form() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let mut form = FormController::new(FakeView::default());
        form.handle_file(pdf("cv.pdf", 100)).unwrap();
        form.set_job_offer(offer(70));

        let outcome = form.submit(&client).await;

        let SubmitOutcome::Failed(err) = outcome else {
            panic!("expected failed outcome");
        };
        assert!(matches!(err, CoreError::Connection(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(form.view().alerts.len(), 1);
        assert!(form.view().alerts[0]
            .starts_with("Error: Could not connect to the analysis service"));
        assert!(form.view().presented.is_empty());
        assert_eq!(form.view().submit_label, SUBMIT_LABEL);
        assert!(form.view().submit_enabled);
        assert!(!form.is_busy());
    }

    #[tokio::test]
    async fn oversized_file_on_disk_is_rejected_from_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("scan.pdf");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();

        let candidate = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.size, MAX_FILE_SIZE + 1);
        assert!(!candidate.is_loaded());

        let mut form = FormController::new(FakeView::default());
        assert!(matches!(
            form.handle_file(candidate),
            Err(CoreError::FileTooLarge { .. })
        ));
        assert!(form.uploaded_file().is_none());
        assert_eq!(form.view().alerts, vec!["The file is too large. Maximum 5MB"]);
    }

    #[tokio::test]
    async fn file_removed_after_pick_fails_before_any_request() {
        let backend = spawn_backend(StatusCode::OK, sample_payload(85.0)).await;
        let client = client_for(&backend.base_url);
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF-1.7 resume").unwrap();

        let mut form = FormController::new(FakeView::default());
        form.handle_file(UploadCandidate::from_path(&path).await.unwrap())
            .unwrap();
        form.set_job_offer(offer(70));
        std::fs::remove_file(&path).unwrap();

        let outcome = form.submit(&client).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(CoreError::FileUnreadable { .. })
        ));
        assert_eq!(backend.analyze_calls(), 0);
        assert!(form.view().alerts[0].starts_with("Error: Could not read cv.pdf"));
        assert_eq!(form.view().submit_label, SUBMIT_LABEL);
        assert!(form.view().submit_enabled);
    }
}
