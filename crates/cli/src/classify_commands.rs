//! `sweeney classify`: run the pipeline on local input without connecting to
//! Discord.

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    sweeney_common::{Attachment, IncomingMessage},
    sweeney_config::{FeatureFlags, SweeneyConfig},
    sweeney_media::FileFetcher,
    sweeney_reactions::Classification,
};

use crate::setup;

fn build_message(text: String, images: &[PathBuf]) -> IncomingMessage {
    images
        .iter()
        .enumerate()
        .fold(IncomingMessage::new(0, text), |message, (index, path)| {
            message.with_attachment(Attachment {
                id: index as u64 + 1,
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content_type: Some("image/*".into()),
                url: path.display().to_string(),
            })
        })
}

pub async fn handle_classify(
    config: &SweeneyConfig,
    flags: FeatureFlags,
    text: String,
    images: &[PathBuf],
    json: bool,
) -> Result<()> {
    let pipeline = setup::pipeline(config, flags, Arc::new(FileFetcher::default())).await?;
    let message = build_message(text, images);
    let outcome = pipeline.evaluate(&message, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        Classification::Ignored => eprintln!("message ignored"),
        Classification::ImageMatched {
            attachment_id,
            template,
            score,
            ..
        } => {
            let source = usize::try_from(*attachment_id)
                .ok()
                .and_then(|id| images.get(id.wrapping_sub(1)))
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            eprintln!("{source} matched template {template} (score {score:.3}), text triggers skipped");
        },
        Classification::TextEvaluated { reactions } if reactions.is_empty() => {
            eprintln!("no triggers matched");
        },
        Classification::TextEvaluated { .. } => {},
    }

    for reaction in outcome.into_queue() {
        println!("{reaction}");
    }
    Ok(())
}
