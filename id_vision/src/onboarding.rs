// THEORY:
// The `onboarding` module is the consumer of the verification pipeline: a
// four-step provider registration wizard. It owns the state a single applicant
// builds up (selected professions, uploaded documents, verdicts) and decides
// whether the applicant may advance past each step.
//
// Key architectural principles:
// 1.  **Verdicts follow uploads**: every upload of a verifiable document resets
//     that document's verdict and recomputes it from scratch. Nothing is patched.
// 2.  **Gates read state, never compute it**: `validate_step` only inspects the
//     verdicts already recorded, so advancing a step never triggers OCR.
// 3.  **Toasts are data**: user-facing messages are returned as `Notice` values
//     and left for the caller to render.

use crate::core_modules::face_match::FaceMatch;
use crate::pipeline::{Verdict, VerificationPipeline};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const MEBIBYTE: u64 = 1024 * 1024;

/// A trade the applicant offers on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    Electrician,
    Carpenter,
    Plumber,
    Locksmith,
    Gardener,
    Photographer,
    Videographer,
    Hairstylist,
    MakeupArtist,
    MassageTherapist,
    HennaArtist,
    Caterer,
}

impl Profession {
    pub const ALL: [Profession; 12] = [
        Profession::Electrician,
        Profession::Carpenter,
        Profession::Plumber,
        Profession::Locksmith,
        Profession::Gardener,
        Profession::Photographer,
        Profession::Videographer,
        Profession::Hairstylist,
        Profession::MakeupArtist,
        Profession::MassageTherapist,
        Profession::HennaArtist,
        Profession::Caterer,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Profession::Electrician => "electrician",
            Profession::Carpenter => "carpenter",
            Profession::Plumber => "plumber",
            Profession::Locksmith => "locksmith",
            Profession::Gardener => "gardener",
            Profession::Photographer => "photographer",
            Profession::Videographer => "videographer",
            Profession::Hairstylist => "hairstylist",
            Profession::MakeupArtist => "makeup_artist",
            Profession::MassageTherapist => "massage_therapist",
            Profession::HennaArtist => "henna_artist",
            Profession::Caterer => "caterer",
        }
    }

    /// Whether the wizard asks this profession for a trade licence.
    pub fn needs_trade_license(&self) -> bool {
        self.licence_graded() || matches!(self, Profession::Locksmith)
    }

    pub fn needs_health_permit(&self) -> bool {
        matches!(
            self,
            Profession::Hairstylist | Profession::MakeupArtist | Profession::MassageTherapist | Profession::HennaArtist
        )
    }

    /// Professions whose status drops to freelancer without the paperwork.
    /// Locksmiths are blocked at step 3 instead.
    fn licence_graded(&self) -> bool {
        matches!(self, Profession::Photographer | Profession::Videographer) || self.needs_health_permit()
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown profession: {0}")]
pub struct UnknownProfession(pub String);

impl FromStr for Profession {
    type Err = UnknownProfession;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profession::ALL
            .into_iter()
            .find(|profession| profession.id() == s)
            .ok_or_else(|| UnknownProfession(s.to_string()))
    }
}

/// The upload slots of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Aadhaar,
    Pan,
    TradeLicense,
    HealthPermit,
    WorkSample,
    /// Repeatable; each upload adds another certificate.
    Certificate,
}

/// A file chosen by the applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub data_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejected {
    #[error("Please upload an image file")]
    NotAnImage,
    #[error("File size should be less than {}MB", .limit_bytes / MEBIBYTE)]
    TooLarge { limit_bytes: u64 },
}

/// Rejects non-image MIME types and files over `max_bytes`.
pub fn check_upload(upload: &Upload, max_bytes: u64) -> Result<(), UploadRejected> {
    if !upload.mime_type.starts_with("image/") {
        return Err(UploadRejected::NotAnImage);
    }
    if upload.size_bytes > max_bytes {
        return Err(UploadRejected::TooLarge { limit_bytes: max_bytes });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast for the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Why the wizard refused to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("Please select at least one profession")]
    NoProfession,
    #[error("Please upload both Aadhaar and PAN card")]
    MissingIdentityDocuments,
    #[error("Aadhaar not verified. Please upload a valid Aadhaar image")]
    AadhaarNotVerified,
    #[error("PAN not verified. Please upload a valid PAN image")]
    PanNotVerified,
    #[error("Trade License is mandatory for Locksmiths")]
    TradeLicenseRequired,
    #[error("Please upload your best work sample")]
    MissingWorkSample,
    #[error("Please capture your face photo")]
    MissingFacePhoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfessionalStatus {
    Professional,
    #[serde(rename = "Amateur/Freelancer")]
    AmateurFreelancer,
}

/// Verification results carried alongside the registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationFlags {
    pub aadhaar_verified: bool,
    pub pan_verified: bool,
    /// One entry per certificate, in upload order.
    pub certificate_verified: Vec<bool>,
    pub face_matched: bool,
    pub extracted_name: String,
}

/// What the registration form persists once all steps pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub professions: Vec<Profession>,
    pub has_trade_license: bool,
    pub has_health_permit: bool,
    pub has_certificates: bool,
    pub professional_status: BTreeMap<Profession, ProfessionalStatus>,
    pub verification: VerificationFlags,
}

/// One applicant's pass through the wizard.
pub struct OnboardingSession {
    pipeline: Arc<VerificationPipeline>,
    max_upload_bytes: u64,
    professions: Vec<Profession>,
    documents: HashMap<DocumentField, String>,
    certificates: Vec<String>,
    aadhaar_verdict: Option<Verdict>,
    pan_verdict: Option<Verdict>,
    certificate_verdicts: Vec<Verdict>,
    extracted_name: String,
    face_photo: Option<String>,
    face_match: Option<FaceMatch>,
}

impl OnboardingSession {
    pub fn new(pipeline: Arc<VerificationPipeline>, max_upload_bytes: u64) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
            professions: Vec::new(),
            documents: HashMap::new(),
            certificates: Vec::new(),
            aadhaar_verdict: None,
            pan_verdict: None,
            certificate_verdicts: Vec::new(),
            extracted_name: String::new(),
            face_photo: None,
            face_match: None,
        }
    }

    pub fn professions(&self) -> &[Profession] {
        &self.professions
    }

    /// Ticks or unticks a profession checkbox.
    pub fn set_profession(&mut self, profession: Profession, selected: bool) {
        let present = self.professions.contains(&profession);
        if selected && !present {
            self.professions.push(profession);
        } else if !selected {
            self.professions.retain(|p| *p != profession);
        }
    }

    /// True when any selected profession asks for a trade licence.
    pub fn requires_trade_license(&self) -> bool {
        self.professions.iter().any(Profession::needs_trade_license)
    }

    pub fn requires_health_permit(&self) -> bool {
        self.professions.iter().any(Profession::needs_health_permit)
    }

    pub fn has_document(&self, field: DocumentField) -> bool {
        match field {
            DocumentField::Certificate => !self.certificates.is_empty(),
            _ => self.documents.contains_key(&field),
        }
    }

    pub fn aadhaar_verdict(&self) -> Option<Verdict> {
        self.aadhaar_verdict
    }

    pub fn pan_verdict(&self) -> Option<Verdict> {
        self.pan_verdict
    }

    pub fn face_match(&self) -> Option<FaceMatch> {
        self.face_match
    }

    /// Stores an upload and verifies it when the field is verifiable.
    pub async fn attach(&mut self, field: DocumentField, upload: Upload) -> Vec<Notice> {
        if let Err(rejected) = check_upload(&upload, self.max_upload_bytes) {
            warn!(file = %upload.file_name, "upload rejected: {rejected}");
            return vec![Notice::error(rejected.to_string())];
        }

        let mut notices = Vec::new();
        let image = upload.data_base64;
        match field {
            DocumentField::Aadhaar => {
                self.documents.insert(field, image.clone());
                self.aadhaar_verdict = None;
                let report = self.pipeline.verify_aadhaar(&image).await;
                self.aadhaar_verdict = Some(report.verdict);
                self.extracted_name = report.extracted_name;
                notices.push(if report.verdict.is_verified() {
                    Notice::success("Aadhaar appears valid")
                } else {
                    Notice::error("Could not verify Aadhaar. Please upload a clearer Aadhaar image")
                });
                self.recheck_against_aadhaar().await;
            }
            DocumentField::Pan => {
                self.documents.insert(field, image.clone());
                self.pan_verdict = None;
                let report = self.pipeline.verify_pan(&image).await;
                self.pan_verdict = Some(report.verdict);
                notices.push(if report.verdict.is_verified() {
                    Notice::success("PAN appears valid")
                } else {
                    Notice::error("Could not verify PAN. Please upload a clearer PAN image")
                });
            }
            DocumentField::Certificate => {
                let report = self.pipeline.verify_certificate(&image, &self.extracted_name).await;
                self.certificates.push(image);
                self.certificate_verdicts.push(report.verdict);
                notices.push(certificate_notice(report.verdict));
            }
            _ => {
                self.documents.insert(field, image);
            }
        }

        notices.push(Notice::success(format!("{} uploaded successfully", upload.file_name)));
        notices
    }

    /// Stores the live face photo and compares it with the Aadhaar image. The first
    /// notice confirms the capture, the second reports the comparison.
    pub fn capture_face(&mut self, image_base64: &str) -> Vec<Notice> {
        if image_base64.trim().is_empty() {
            return vec![Notice::error("Failed to capture face photo")];
        }
        self.face_photo = Some(image_base64.to_string());
        let outcome = self.compare_face();
        vec![Notice::success("Face photo captured successfully"), face_notice(outcome)]
    }

    fn compare_face(&mut self) -> Option<FaceMatch> {
        let face = self.face_photo.as_deref()?;
        let aadhaar = self.documents.get(&DocumentField::Aadhaar).map(String::as_str);
        let outcome = self.pipeline.match_faces(aadhaar, Some(face));
        info!(?outcome, "face compared with Aadhaar image");
        self.face_match = Some(outcome);
        aadhaar.map(|_| outcome)
    }

    /// Certificates and the face photo are judged against the Aadhaar card, so a new
    /// card recomputes both.
    async fn recheck_against_aadhaar(&mut self) {
        if !self.certificates.is_empty() {
            let reports = self
                .pipeline
                .verify_certificates(&self.certificates, &self.extracted_name)
                .await;
            self.certificate_verdicts = reports.into_iter().map(|report| report.verdict).collect();
        }
        self.compare_face();
    }

    /// Gate for leaving `step`. Unknown steps always pass.
    pub fn validate_step(&self, step: u8) -> Result<(), StepError> {
        let result = match step {
            1 => self.check_professions(),
            2 => self.check_identity(),
            3 => self.check_work_documents(),
            4 => match self.face_photo {
                Some(_) => Ok(()),
                None => Err(StepError::MissingFacePhoto),
            },
            _ => Ok(()),
        };
        if let Err(e) = &result {
            warn!(step, "step blocked: {e}");
        }
        result
    }

    fn check_professions(&self) -> Result<(), StepError> {
        if self.professions.is_empty() {
            return Err(StepError::NoProfession);
        }
        Ok(())
    }

    fn check_identity(&self) -> Result<(), StepError> {
        if !self.has_document(DocumentField::Aadhaar) || !self.has_document(DocumentField::Pan) {
            return Err(StepError::MissingIdentityDocuments);
        }
        if !self.aadhaar_verdict.is_some_and(|v| v.is_verified()) {
            return Err(StepError::AadhaarNotVerified);
        }
        if !self.pan_verdict.is_some_and(|v| v.is_verified()) {
            return Err(StepError::PanNotVerified);
        }
        Ok(())
    }

    fn check_work_documents(&self) -> Result<(), StepError> {
        let locksmith = self.professions.contains(&Profession::Locksmith);
        if locksmith && !self.has_document(DocumentField::TradeLicense) {
            return Err(StepError::TradeLicenseRequired);
        }
        if !self.has_document(DocumentField::WorkSample) {
            return Err(StepError::MissingWorkSample);
        }
        Ok(())
    }

    pub fn flags(&self) -> VerificationFlags {
        VerificationFlags {
            aadhaar_verified: self.aadhaar_verdict.is_some_and(|v| v.is_verified()),
            pan_verified: self.pan_verdict.is_some_and(|v| v.is_verified()),
            certificate_verified: self.certificate_verdicts.iter().map(Verdict::is_verified).collect(),
            face_matched: self.face_match.is_some_and(|m| m.is_match()),
            extracted_name: self.extracted_name.clone(),
        }
    }

    pub fn summary(&self) -> RegistrationSummary {
        let has_trade_license = self.has_document(DocumentField::TradeLicense);
        let has_health_permit = self.has_document(DocumentField::HealthPermit);

        let professional_status = self
            .professions
            .iter()
            .map(|&profession| {
                let missing_paperwork = profession.licence_graded()
                    && (!has_trade_license || (profession.needs_health_permit() && !has_health_permit));
                let status = if missing_paperwork {
                    ProfessionalStatus::AmateurFreelancer
                } else {
                    ProfessionalStatus::Professional
                };
                (profession, status)
            })
            .collect();

        RegistrationSummary {
            professions: self.professions.clone(),
            has_trade_license,
            has_health_permit,
            has_certificates: self.has_document(DocumentField::Certificate),
            professional_status,
            verification: self.flags(),
        }
    }
}

fn certificate_notice(verdict: Verdict) -> Notice {
    match verdict {
        Verdict::Verified => Notice::success("Certificate name matches your Aadhaar"),
        Verdict::Rejected => Notice::error("Certificate name did not match your Aadhaar name"),
        Verdict::Unverified(_) => Notice::error("Could not read the certificate. Please upload a clearer image"),
    }
}

/// `None` means there was no Aadhaar image to compare against.
fn face_notice(outcome: Option<FaceMatch>) -> Notice {
    match outcome {
        Some(FaceMatch::Matched { .. }) => Notice::success("Face matches your Aadhaar photo"),
        Some(FaceMatch::Mismatched { .. }) => {
            Notice::error("Face does not match your Aadhaar photo. Please retake the photo")
        }
        Some(FaceMatch::Unknown) => {
            Notice::error("Could not compare your face with the Aadhaar image. Please upload a clearer Aadhaar image")
        }
        None => Notice::error("Upload your Aadhaar card so your face photo can be compared"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::core_modules::ocr_engine::{OcrEngine, Recognition, SharedOcrEngine};
    use crate::error::VisionResult;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl OcrEngine for Silent {
        async fn recognize(&self, _image_png: &[u8], _language: &str) -> VisionResult<Recognition> {
            Ok(Recognition::default())
        }

        fn engine_name(&self) -> &str {
            "silent"
        }
    }

    fn session() -> OnboardingSession {
        let config = PipelineConfig::default();
        let pipeline = VerificationPipeline::new(&config, SharedOcrEngine::preloaded(Arc::new(Silent)));
        OnboardingSession::new(Arc::new(pipeline), config.max_upload_bytes)
    }

    fn upload(name: &str, mime: &str, size: u64) -> Upload {
        Upload {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            size_bytes: size,
            data_base64: String::new(),
        }
    }

    #[test]
    fn profession_ids_round_trip_through_from_str() {
        assert_eq!("makeup_artist".parse::<Profession>(), Ok(Profession::MakeupArtist));
        assert!("astronaut".parse::<Profession>().is_err());
        assert_eq!(Profession::HennaArtist.to_string(), "henna_artist");
    }

    #[test]
    fn licence_requirements_by_profession() {
        assert!(Profession::Locksmith.needs_trade_license());
        assert!(Profession::Photographer.needs_trade_license());
        assert!(!Profession::Plumber.needs_trade_license());
        assert!(Profession::HennaArtist.needs_health_permit());
        assert!(!Profession::Videographer.needs_health_permit());
    }

    #[test]
    fn upload_checks_type_then_size() {
        let limit = 5 * MEBIBYTE;
        assert_eq!(check_upload(&upload("a.pdf", "application/pdf", 10), limit), Err(UploadRejected::NotAnImage));
        let too_big = check_upload(&upload("a.jpg", "image/jpeg", limit + 1), limit).unwrap_err();
        assert_eq!(too_big.to_string(), "File size should be less than 5MB");
        assert!(check_upload(&upload("a.jpg", "image/jpeg", limit), limit).is_ok());
    }

    #[tokio::test]
    async fn rejected_upload_is_not_stored() {
        let mut session = session();
        let notices = session.attach(DocumentField::WorkSample, upload("cv.txt", "text/plain", 5)).await;
        assert_eq!(notices, vec![Notice::error("Please upload an image file")]);
        assert!(!session.has_document(DocumentField::WorkSample));
    }

    #[test]
    fn step_one_needs_a_profession() {
        let mut session = session();
        assert_eq!(session.validate_step(1), Err(StepError::NoProfession));
        session.set_profession(Profession::Gardener, true);
        session.set_profession(Profession::Gardener, true);
        assert_eq!(session.professions(), &[Profession::Gardener]);
        assert_eq!(session.validate_step(1), Ok(()));
        session.set_profession(Profession::Gardener, false);
        assert_eq!(session.validate_step(1), Err(StepError::NoProfession));
    }

    #[tokio::test]
    async fn step_three_blocks_locksmith_without_licence() {
        let mut session = session();
        session.set_profession(Profession::Locksmith, true);
        assert_eq!(session.validate_step(3), Err(StepError::TradeLicenseRequired));

        session.attach(DocumentField::TradeLicense, upload("licence.png", "image/png", 100)).await;
        assert_eq!(session.validate_step(3), Err(StepError::MissingWorkSample));

        let notices = session.attach(DocumentField::WorkSample, upload("work.png", "image/png", 100)).await;
        assert_eq!(notices, vec![Notice::success("work.png uploaded successfully")]);
        assert_eq!(session.validate_step(3), Ok(()));
    }

    #[test]
    fn other_steps_pass() {
        let session = session();
        assert_eq!(session.validate_step(0), Ok(()));
        assert_eq!(session.validate_step(5), Ok(()));
        assert_eq!(session.validate_step(4), Err(StepError::MissingFacePhoto));
    }

    #[tokio::test]
    async fn status_degrades_without_paperwork() {
        let mut session = session();
        for profession in [Profession::Hairstylist, Profession::Photographer, Profession::Locksmith, Profession::Plumber] {
            session.set_profession(profession, true);
        }
        session.attach(DocumentField::TradeLicense, upload("licence.png", "image/png", 100)).await;

        let summary = session.summary();
        assert!(summary.has_trade_license);
        assert!(!summary.has_health_permit);
        assert_eq!(summary.professional_status[&Profession::Hairstylist], ProfessionalStatus::AmateurFreelancer);
        assert_eq!(summary.professional_status[&Profession::Photographer], ProfessionalStatus::Professional);
        assert_eq!(summary.professional_status[&Profession::Locksmith], ProfessionalStatus::Professional);
        assert_eq!(summary.professional_status[&Profession::Plumber], ProfessionalStatus::Professional);
    }

    #[test]
    fn blank_capture_is_refused() {
        let mut session = session();
        assert_eq!(session.capture_face("  "), vec![Notice::error("Failed to capture face photo")]);
        assert_eq!(session.validate_step(4), Err(StepError::MissingFacePhoto));
    }

    #[test]
    fn capture_without_aadhaar_asks_for_the_card() {
        let mut session = session();
        let notices = session.capture_face("aGVsbG8=");
        assert_eq!(notices[0], Notice::success("Face photo captured successfully"));
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert!(notices[1].message.starts_with("Upload your Aadhaar card"));
        assert_eq!(session.validate_step(4), Ok(()));
        assert!(!session.flags().face_matched);
    }

    #[test]
    fn face_notices_keep_unknown_apart_from_mismatch() {
        let mismatch = face_notice(Some(FaceMatch::Mismatched {
            distance: crate::HashDistance::Bits(30),
        }));
        let unknown = face_notice(Some(FaceMatch::Unknown));
        assert_eq!(mismatch.level, NoticeLevel::Error);
        assert_eq!(unknown.level, NoticeLevel::Error);
        assert_ne!(mismatch.message, unknown.message);
        assert_eq!(face_notice(Some(FaceMatch::Matched { distance: 3 })).level, NoticeLevel::Success);
    }
}
