use super::EventContext;

pub async fn handle_review_toggle(
    ctx: &mut EventContext,
    id: String,
    checked: bool,
) -> anyhow::Result<()> {
    let result = {
        let mut session = ctx.session.lock().await;
        ctx.scheduler
            .toggle(&mut session, &ctx.state.account, &id, checked)
            .await
    };

    match result {
        Ok(Some(entry)) => {
            tracing::info!(
                "Review for '{}' {}",
                entry.word,
                if checked { "checked" } else { "unchecked" }
            );
            if let Err(e) = ctx.status_tx.try_send(lingo_types::AppEvent::RefreshVocabulary) {
                tracing::debug!("Refresh signal not delivered: {}", e);
            }
        }
        Ok(None) => tracing::warn!("Review toggle ignored, entry {} is gone", id),
        Err(e) => tracing::error!("Failed to update review for {}: {}", id, e),
    }

    Ok(())
}
