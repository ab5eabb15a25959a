//! Sample rendering and batch generation.

use crate::keys::{certificate_keys, FONT_KEY, SAMPLE_KEY, TEMPLATE_KEY};
use crate::render::{CertificateRenderer, TextStyle};
use crate::upload::{validate_font, validate_template};
use eventdesk_core::providers::AssetStore;
use eventdesk_core::{DeskError, Participant, ParticipantId, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// A certificate that could not be produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFailure {
    /// Participant whose certificate failed.
    pub participant_id: ParticipantId,
    /// What went wrong.
    pub error: String,
}

/// Outcome of a settle-all generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Certificates written.
    pub generated: usize,
    /// Certificates that failed.
    pub failed: usize,
    /// Keys of the written certificates.
    pub files: Vec<String>,
    /// Per-participant failure details.
    pub failures: Vec<RenderFailure>,
}

impl GenerationReport {
    /// Human-readable summary shown to the organizer.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} certificates generated, {} failed.",
            self.generated, self.failed
        )
    }
}

/// Certificate operations over an [`AssetStore`].
#[derive(Clone, Debug)]
pub struct CertificateService<A> {
    assets: A,
}

impl<A: AssetStore> CertificateService<A> {
    /// Service storing templates, fonts and output in `assets`.
    #[must_use]
    pub const fn new(assets: A) -> Self {
        Self { assets }
    }

    /// Underlying asset store.
    #[must_use]
    pub const fn assets(&self) -> &A {
        &self.assets
    }

    /// Validate and store a template upload.
    ///
    /// # Errors
    ///
    /// [`DeskError::Validation`] for a rejected upload, [`DeskError::Storage`]
    /// if it cannot be stored.
    pub async fn upload_template(&self, content_type: Option<&str>, bytes: Vec<u8>) -> Result<()> {
        validate_template(content_type, &bytes)?;
        self.assets.put(TEMPLATE_KEY, bytes).await?;
        tracing::info!("Certificate template uploaded");
        Ok(())
    }

    /// Validate and store a font upload.
    ///
    /// # Errors
    ///
    /// [`DeskError::Validation`] for a rejected upload, [`DeskError::Storage`]
    /// if it cannot be stored.
    pub async fn upload_font(&self, file_name: Option<&str>, bytes: Vec<u8>) -> Result<()> {
        validate_font(file_name, &bytes)?;
        self.assets.put(FONT_KEY, bytes).await?;
        tracing::info!(file_name = ?file_name, "Certificate font uploaded");
        Ok(())
    }

    /// Load the uploaded template and font.
    ///
    /// # Errors
    ///
    /// [`DeskError::Validation`] if either asset has not been uploaded yet.
    pub async fn renderer(&self) -> Result<CertificateRenderer> {
        let template = self.assets.get(TEMPLATE_KEY).await?.ok_or_else(|| {
            DeskError::validation("No certificate template uploaded. Upload a PNG template first")
        })?;
        let font = self.assets.get(FONT_KEY).await?.ok_or_else(|| {
            DeskError::validation("No certificate font uploaded. Upload a TTF or OTF font first")
        })?;

        tokio::task::spawn_blocking(move || CertificateRenderer::from_assets(&template, font))
            .await
            .map_err(|e| DeskError::Rendering(format!("Renderer task failed: {e}")))?
    }

    /// Render `name` as the sample certificate; returns the key it was stored under.
    ///
    /// # Errors
    ///
    /// As [`renderer`](Self::renderer), plus rendering or storage failures.
    #[tracing::instrument(skip(self, style))]
    pub async fn render_sample(&self, name: &str, style: &TextStyle) -> Result<String> {
        let renderer = Arc::new(self.renderer().await?);
        renderer.check_style(style)?;
        let png = render_blocking(renderer, name.to_string(), style.clone()).await?;
        self.assets.put(SAMPLE_KEY, png).await?;
        Ok(SAMPLE_KEY.to_string())
    }

    /// The last sample certificate.
    ///
    /// # Errors
    ///
    /// [`DeskError::NotFound`] if no sample has been rendered.
    pub async fn sample(&self) -> Result<Vec<u8>> {
        self.assets
            .get(SAMPLE_KEY)
            .await?
            .ok_or_else(|| DeskError::NotFound {
                resource: "Sample certificate",
                id: SAMPLE_KEY.to_string(),
            })
    }

    /// Render and store a certificate for every participant in `participants`.
    ///
    /// Every certificate is attempted; failures are collected, not fatal.
    ///
    /// # Errors
    ///
    /// Only a missing template or font, or a style that does not fit the
    /// template, is returned as an error.
    #[tracing::instrument(skip_all, fields(participants = participants.len()))]
    pub async fn generate(&self, participants: &[Participant], style: &TextStyle) -> Result<GenerationReport> {
        let renderer = Arc::new(self.renderer().await?);
        renderer.check_style(style)?;

        let keys = certificate_keys(participants);
        let outcomes = join_all(participants.iter().zip(keys).map(|(participant, key)| {
            let renderer = Arc::clone(&renderer);
            async move {
                let key = key.ok_or_else(|| {
                    DeskError::Storage(format!(
                        "Another certificate in this batch already uses the file name for {}",
                        participant.name
                    ))
                })?;
                let png = render_blocking(renderer, participant.name.clone(), style.clone()).await?;
                self.assets.put(&key, png).await?;
                Ok::<_, DeskError>(key)
            }
        }))
        .await;

        let mut report = GenerationReport::default();
        for (participant, outcome) in participants.iter().zip(outcomes) {
            match outcome {
                Ok(key) => {
                    metrics::counter!("desk.certificates.rendered").increment(1);
                    report.generated += 1;
                    report.files.push(key);
                },
                Err(error) => {
                    metrics::counter!("desk.certificates.failed").increment(1);
                    tracing::warn!(participant_id = %participant.id, error = %error, "Certificate generation failed");
                    report.failed += 1;
                    report.failures.push(RenderFailure {
                        participant_id: participant.id.clone(),
                        error: error.to_string(),
                    });
                },
            }
        }

        tracing::info!(generated = report.generated, failed = report.failed, "Certificate batch settled");
        Ok(report)
    }
}

async fn render_blocking(
    renderer: Arc<CertificateRenderer>,
    name: String,
    style: TextStyle,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let png = tokio::task::spawn_blocking(move || renderer.render(&name, &style))
        .await
        .map_err(|e| DeskError::Rendering(format!("Render task failed: {e}")))??;
    metrics::histogram!("desk.certificates.render.duration_seconds")
        .record(started.elapsed().as_secs_f64());
    Ok(png)
}
