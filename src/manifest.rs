//! Manifest builder
//!
//! Walks the catalog's pages for one collection, fans every record out into
//! image descriptors, resolves collision-free target names, and produces the
//! full job list with every job `pending`. Building is all-or-nothing: a
//! catalog failure mid-pagination aborts the build without writing a partial
//! ledger, so occurrence numbering can never be derived from a truncated
//! record sequence.

use crate::catalog::CatalogClient;
use crate::error::{Error, Result};
use crate::ledger;
use crate::naming::{NameCounter, infer_ext, target_filename};
use crate::types::{Job, JobStatus};
use std::path::Path;

/// Build the complete job list for `collection`
///
/// Records and descriptors are processed strictly in catalog order, which is
/// what makes occurrence numbering deterministic. A [`Error::NotFound`] on
/// the first page means the collection has no records at all and yields an
/// empty (valid) manifest; any other failure aborts the build.
pub async fn build_manifest(client: &dyn CatalogClient, collection: &str) -> Result<Vec<Job>> {
    let collection = collection.trim().to_ascii_uppercase();
    let mut jobs = Vec::new();
    let mut counter = NameCounter::new();
    let mut skipped_records = 0usize;
    let mut page = 1u32;

    loop {
        let result = client.fetch_page(&collection, page).await;
        let catalog_page = match result {
            Ok(p) => p,
            Err(Error::NotFound(_)) if page == 1 => {
                tracing::info!(%collection, "no catalog results, manifest is empty");
                return Ok(Vec::new());
            }
            Err(Error::NotFound(reason)) => {
                return Err(Error::Manifest(format!(
                    "catalog page {page} vanished mid-pagination: {reason}"
                )));
            }
            Err(e) => return Err(e),
        };

        for record in &catalog_page.records {
            let descriptors = crate::descriptor::describe(record);
            if descriptors.is_empty() {
                skipped_records += 1;
                tracing::debug!(record_id = %record.id, "record has no usable image, skipping");
                continue;
            }

            for descriptor in descriptors {
                let occurrence = counter.next(&collection, &descriptor.display_name);
                // Rotated variants are re-encoded on write, so their target
                // extension is fixed to .jpg no matter what the source serves
                let ext = if descriptor.rotate.forces_reencode() {
                    ".jpg"
                } else {
                    infer_ext(&descriptor.url)
                };
                let target = target_filename(&descriptor.display_name, occurrence, ext);

                jobs.push(Job {
                    collection: collection.clone(),
                    record_id: record.id.clone(),
                    layout: record.layout.clone(),
                    face: descriptor.face_index,
                    image_url: descriptor.url,
                    target,
                    rotate: descriptor.rotate,
                    status: JobStatus::Pending,
                    error: String::new(),
                });
            }
        }

        if !catalog_page.has_more {
            break;
        }
        page += 1;
    }

    tracing::info!(
        %collection,
        jobs = jobs.len(),
        skipped_records,
        pages = page,
        "manifest built"
    );
    Ok(jobs)
}

/// Load the ledger at `path`, building and storing it first if absent
///
/// An existing ledger is authoritative and is never rebuilt here, even if
/// the catalog has changed since it was written: rebuilding would renumber
/// targets out from under already-downloaded files.
pub async fn ensure_manifest(
    client: &dyn CatalogClient,
    collection: &str,
    path: &Path,
) -> Result<Vec<Job>> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "ledger exists, loading");
        return ledger::load(path);
    }

    let jobs = build_manifest(client, collection).await?;
    ledger::store(path, &jobs)?;
    Ok(jobs)
}
