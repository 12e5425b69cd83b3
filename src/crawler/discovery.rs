//! Channel discovery
//!
//! Resolves the configured channel, registers every uploaded video in the
//! checkpoint and lists the channel's playlists. Every request is charged to
//! the session budget like a harvest page.

use crate::checkpoint::CheckpointStore;
use crate::client::{CommentService, ServiceError, ServiceResult};
use crate::config::ChannelConfig;
use crate::crawler::pagination::{collect_all, PaginatedWalk};
use crate::crawler::StopSignal;
use crate::quota::{QuotaBudget, PAGE_COST};
use crate::HarvestError;
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of registering a channel's uploads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Video ids listed by the uploads playlist
    pub found: usize,

    /// Ids that were not registered before
    pub registered: usize,

    pub units_used: u64,

    /// False if the listing stopped before its last page
    pub complete: bool,
}

/// Returns the channel id, resolving the handle if no id is configured
///
/// # Returns
///
/// * `Ok(String)` - The channel id
/// * `Err(HarvestError::ChannelNotFound)` - No channel has the handle
/// * `Err(HarvestError)` - Budget or service failure
pub async fn resolve_channel<S: CommentService>(
    service: &S,
    budget: &QuotaBudget,
    channel: &ChannelConfig,
) -> Result<String, HarvestError> {
    if let Some(id) = &channel.id {
        return Ok(id.clone());
    }
    let handle = channel
        .handle
        .as_deref()
        .ok_or_else(|| HarvestError::ChannelNotFound("no handle or id configured".to_string()))?;

    let id = single_request(budget, service.resolve_channel_id(handle))
        .await
        .map_err(|e| match e {
            HarvestError::Service(ServiceError::NotFound(_)) => {
                HarvestError::ChannelNotFound(handle.to_string())
            }
            e => e,
        })?;

    tracing::info!("Resolved {} to channel {}", handle, id);
    Ok(id)
}

/// Registers every upload of `channel_id` as a pending video
///
/// Already registered videos are left untouched, so running discovery again
/// only adds new uploads. The checkpoint is persisted even if the listing
/// fails part way.
pub async fn register_uploads<S, C>(
    service: &S,
    store: &mut C,
    budget: &QuotaBudget,
    stop: &StopSignal,
    channel_id: &str,
) -> Result<DiscoveryReport, HarvestError>
where
    S: CommentService,
    C: CheckpointStore + ?Sized,
{
    let uploads = single_request(budget, service.uploads_playlist(channel_id)).await?;
    let uploads = uploads.as_str();
    tracing::info!("Listing uploads playlist {}", uploads);

    let mut report = DiscoveryReport::default();
    let mut walk = PaginatedWalk::new(None, budget.remaining().units()).with_stop(stop.clone());

    let listed = async {
        while let Some(page) = walk
            .next_page(|cursor| async move {
                service.list_playlist_items(uploads, cursor.as_ref()).await
            })
            .await?
        {
            for video_id in &page.items {
                report.found += 1;
                if store.register_video(video_id)? {
                    report.registered += 1;
                }
            }
        }
        Ok::<(), HarvestError>(())
    }
    .await;

    settle(budget, walk.units_used(), listed.as_ref().err());
    store.persist()?;
    listed?;

    report.units_used = PAGE_COST + walk.units_used();
    report.complete = walk.is_complete();
    if !report.complete {
        tracing::warn!(
            "Uploads listing stopped early after {} videos; run discovery again to continue",
            report.found
        );
    }
    tracing::info!(
        "Found {} uploads, {} newly registered",
        report.found,
        report.registered
    );
    Ok(report)
}

/// Writes the channel's playlists to `path` as a JSON array
///
/// Refuses to replace an existing file unless `overwrite` is set.
///
/// # Returns
///
/// * `Ok(usize)` - Number of playlists written
/// * `Err(HarvestError::AlreadyExists)` - `path` exists and `overwrite` is false
pub async fn save_channel_playlists<S: CommentService>(
    service: &S,
    budget: &QuotaBudget,
    stop: &StopSignal,
    channel_id: &str,
    path: &Path,
    overwrite: bool,
) -> Result<usize, HarvestError> {
    if path.exists() && !overwrite {
        return Err(HarvestError::AlreadyExists(path.display().to_string()));
    }

    let mut walk = PaginatedWalk::new(None, budget.remaining().units()).with_stop(stop.clone());
    let listed = collect_all(&mut walk, |cursor| async move {
        service.list_playlists(channel_id, cursor.as_ref()).await
    })
    .await
    .map_err(HarvestError::from);
    settle(budget, walk.units_used(), listed.as_ref().err());
    let playlists = listed?;

    if !walk.is_complete() {
        tracing::warn!("Playlist listing stopped early; writing the first {}", playlists.len());
    }
    write_json_atomic(path, &playlists)?;
    tracing::info!("Wrote {} playlists to {}", playlists.len(), path.display());
    Ok(playlists.len())
}

/// Reserves one unit, then performs a single-page request
///
/// A failed request releases its unit, matching `PaginatedWalk`, which only
/// counts pages the service returned.
async fn single_request<T>(
    budget: &QuotaBudget,
    request: impl Future<Output = ServiceResult<T>>,
) -> Result<T, HarvestError> {
    if !budget.try_reserve(PAGE_COST) {
        return Err(HarvestError::BudgetDepleted);
    }
    request.await.map_err(|e| {
        budget.release(PAGE_COST);
        if e.is_quota_exceeded() {
            budget.mark_exhausted();
        }
        e.into()
    })
}

/// Charges a finished walk and latches quota exhaustion
fn settle(budget: &QuotaBudget, units: u64, error: Option<&HarvestError>) {
    budget.charge(units);
    if let Some(HarvestError::Service(e)) = error {
        if e.is_quota_exceeded() {
            budget.mark_exhausted();
        }
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = PathBuf::from(path);
    tmp.set_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
