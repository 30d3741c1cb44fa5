use serde::Serialize;

use super::{Manager, ParanoidError};

/// What a prefetch pass loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchReport {
    pub origins: usize,
    pub identities: usize,
    pub fields: usize,
    pub foreign_fields: usize,
    /// Failures that were logged and skipped
    pub errors: usize,
}

impl Manager {
    /// Walk everything reachable from the origin list so later requests are
    /// served from the cache.
    ///
    /// Never fails: an origin that cannot be loaded is logged, counted and
    /// skipped.
    pub async fn prefetch(&self) -> PrefetchReport {
        let mut report = PrefetchReport::default();

        let origins = match self.list_origins().await {
            Ok(origins) => origins,
            Err(e) => {
                tracing::error!(error = %e, "prefetch could not list origins");
                report.errors += 1;
                return report;
            }
        };

        for origin in &origins {
            if let Err(e) = self.prefetch_origin(origin, &mut report).await {
                tracing::warn!(origin, error = %e, "prefetch skipped origin");
                report.errors += 1;
            }
        }
        report.origins = origins.len();

        tracing::info!(
            origins = report.origins,
            identities = report.identities,
            fields = report.fields,
            foreign_fields = report.foreign_fields,
            errors = report.errors,
            "prefetch complete"
        );
        tracing::trace!(stats = ?self.cache.stats(), "cache after prefetch");
        report
    }

    async fn prefetch_origin(
        &self,
        origin: &str,
        report: &mut PrefetchReport,
    ) -> Result<(), ParanoidError> {
        self.get_service(origin).await?;

        for uid in self.list_service_uids(origin).await? {
            let Some(identity) = self.get_service_identity(origin, &uid).await? else {
                continue;
            };
            report.identities += 1;

            for field_name in identity.field_names() {
                if self.decrypt_field(origin, &uid, field_name).await?.is_some() {
                    report.fields += 1;
                }
            }
        }

        report.foreign_fields += self
            .resolve_foreign_map(origin)
            .await?
            .values()
            .map(|fields| fields.len())
            .sum::<usize>();
        Ok(())
    }
}
