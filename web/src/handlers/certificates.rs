//! Certificate assets, sample rendering and batch generation.

use crate::error::AppError;
use crate::extractors::AuthenticatedOrganizer;
use crate::handlers::json_body;
use crate::state::{AppState, Services};
use axum::extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use eventdesk_certificates::{GenerationReport, SampleRequest, StyleRequest};
use eventdesk_core::providers::ParticipantRepository;
use eventdesk_core::ParticipantFilter;
use serde::Serialize;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// What happened.
    pub message: &'static str,
}

/// A rendered sample.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleResponse {
    /// What happened.
    pub message: &'static str,
    /// Storage key of the sample image.
    pub file_path: String,
}

/// Outcome of batch generation.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// Summary line, e.g. "3 certificates generated, 0 failed."
    pub message: String,
    /// Counts, keys and failures.
    #[serde(flatten)]
    pub report: GenerationReport,
}

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, AppError> {
    let mut multipart = multipart.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        if file_name.as_deref() == Some("") {
            return Err(AppError::bad_request("No selected file"));
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        return Ok(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::bad_request("No file part"))
}

/// `POST /api/certificates/template`
///
/// Multipart upload of the PNG background, field `file`.
///
/// # Errors
///
/// 400 for a missing file, a non-PNG MIME type or undecodable bytes.
pub async fn upload_template<D: Services>(
    State(state): State<AppState<D>>,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Ack>, AppError> {
    let upload = read_upload(multipart).await?;
    let size = upload.bytes.len();

    state
        .certificates
        .upload_template(upload.content_type.as_deref(), upload.bytes)
        .await?;

    tracing::info!(size, organizer = %organizer.name, "Certificate template uploaded");
    Ok(Json(Ack {
        message: "Template uploaded successfully",
    }))
}

/// `POST /api/certificates/font`
///
/// Multipart upload of a `.ttf` or `.otf` font, field `file`.
///
/// # Errors
///
/// 400 for a missing file, another extension or an unparseable font.
pub async fn upload_font<D: Services>(
    State(state): State<AppState<D>>,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Ack>, AppError> {
    let upload = read_upload(multipart).await?;
    let size = upload.bytes.len();

    state
        .certificates
        .upload_font(upload.file_name.as_deref(), upload.bytes)
        .await?;

    tracing::info!(
        size,
        file_name = upload.file_name.as_deref().unwrap_or_default(),
        organizer = %organizer.name,
        "Certificate font uploaded"
    );
    Ok(Json(Ack {
        message: "Font uploaded successfully",
    }))
}

/// `POST /api/certificates/sample`
///
/// Renders one certificate for `name` with the given style and stores it
/// as the sample.
///
/// # Errors
///
/// 400 for missing fields, a bad colour, or a missing template or font.
pub async fn render_sample<D: Services>(
    State(state): State<AppState<D>>,
    payload: Result<Json<SampleRequest>, JsonRejection>,
) -> Result<Json<SampleResponse>, AppError> {
    let (name, style) = json_body(payload)?.resolve()?;
    let file_path = state.certificates.render_sample(&name, &style).await?;

    Ok(Json(SampleResponse {
        message: "Certificate generated successfully",
        file_path,
    }))
}

/// `GET /api/certificates/sample`
///
/// # Errors
///
/// 404 until a sample has been rendered.
pub async fn download_sample<D: Services>(
    State(state): State<AppState<D>>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.certificates.sample().await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// `POST /api/certificates/generate`
///
/// Renders a certificate for every participant who was selected and
/// attended. Individual failures are reported, not fatal.
///
/// # Errors
///
/// 400 for a bad style or missing assets, 404 when nobody is eligible.
pub async fn generate<D: Services>(
    State(state): State<AppState<D>>,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    payload: Result<Json<StyleRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let style = json_body(payload)?.resolve()?;

    let recipients = state
        .participants
        .list(ParticipantFilter::certificate_recipients())
        .await?;
    if recipients.is_empty() {
        return Err(AppError::not_found(
            "No participants have both attended and been selected",
        ));
    }

    let report = state.certificates.generate(&recipients, &style).await?;
    tracing::info!(
        generated = report.generated,
        failed = report.failed,
        organizer = %organizer.name,
        "Certificates generated"
    );

    Ok(Json(GenerationResponse {
        message: report.summary(),
        report,
    }))
}
