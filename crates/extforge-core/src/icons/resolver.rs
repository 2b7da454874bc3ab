//! Two-tier icon lookup

use super::decode::decode_payload;
use super::scan::collect_required_paths;
use crate::error::{PayloadOrigin, ResolveError};
use crate::store::{ProjectAssetStore, SharedIconStore};
use crate::types::{ProjectAsset, ProjectId, SharedIconRecord, Visibility};
use extforge_artifact::{ArchivePath, FileSet};
use extforge_manifest::{IconFill, Manifest};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Tier that supplied an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSource {
    ProjectAsset,
    SharedStore,
}

/// Decoded icon bytes and their origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIcon {
    pub bytes: Vec<u8>,
    pub source: IconSource,
}

/// Every required icon, by archive path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIcons {
    icons: BTreeMap<ArchivePath, ResolvedIcon>,
    fill: IconFill,
}

impl ResolvedIcons {
    /// Icon at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ResolvedIcon> {
        self.icons.get(path)
    }

    /// Number of icons
    #[must_use]
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Icons in path order
    pub fn iter(&self) -> impl Iterator<Item = (&ArchivePath, &ResolvedIcon)> {
        self.icons.iter()
    }

    /// Count of icons served by `source`
    #[must_use]
    pub fn count_from(&self, source: IconSource) -> usize {
        self.icons.values().filter(|icon| icon.source == source).count()
    }

    /// Manifest changes made by default-fill before lookup
    #[must_use]
    pub fn fill(&self) -> &IconFill {
        &self.fill
    }
}

/// Resolves required icons against project assets, then shared icons
#[derive(Clone)]
pub struct IconResolver {
    assets: Arc<dyn ProjectAssetStore>,
    shared: Arc<dyn SharedIconStore>,
    visibility: Visibility,
}

impl std::fmt::Debug for IconResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconResolver")
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

impl IconResolver {
    /// Create a resolver searching `visibility` in the shared tier
    #[must_use]
    pub fn new(
        assets: Arc<dyn ProjectAssetStore>,
        shared: Arc<dyn SharedIconStore>,
        visibility: Visibility,
    ) -> Self {
        Self {
            assets,
            shared,
            visibility,
        }
    }

    /// Default-fill `manifest`, collect every required icon and resolve it
    ///
    /// `manifest` is left default-filled whether or not resolution succeeds.
    ///
    /// # Errors
    /// - [`ResolveError::IconDecode`] if a matching payload does not decode
    /// - [`ResolveError::MissingIcons`] listing every unresolved path
    /// - [`ResolveError::Store`] if a lookup fails
    #[tracing::instrument(skip_all, fields(project = %project))]
    pub async fn resolve(
        &self,
        project: &ProjectId,
        manifest: &mut Manifest,
        files: &FileSet,
    ) -> Result<ResolvedIcons, ResolveError> {
        let fill = manifest.fill_default_icons();
        if fill.changed() {
            tracing::debug!(
                icons_added = ?fill.icons_added,
                action_added = ?fill.action_added,
                "filled canonical icon sizes"
            );
        }

        let required = collect_required_paths(manifest, files).await?;
        let mut resolved = self.resolve_paths(project, &required).await?;
        resolved.fill = fill;
        Ok(resolved)
    }

    /// Resolve an explicit set of icon paths
    ///
    /// Both tiers are queried concurrently. A path answered by the project's
    /// assets never uses the shared store, and the shadowed shared record is
    /// not decoded.
    ///
    /// # Errors
    /// See [`IconResolver::resolve`].
    pub async fn resolve_paths(
        &self,
        project: &ProjectId,
        required: &BTreeSet<String>,
    ) -> Result<ResolvedIcons, ResolveError> {
        let mut missing = Vec::new();
        // Keyed by the normalized path; the raw spelling is kept for errors.
        let mut wanted: BTreeMap<ArchivePath, String> = BTreeMap::new();
        for raw in required {
            match ArchivePath::new(raw) {
                Ok(path) => {
                    wanted.entry(path).or_insert_with(|| raw.clone());
                }
                Err(err) => {
                    tracing::warn!(path = %raw, error = %err, "icon path cannot be bundled");
                    missing.push(raw.clone());
                }
            }
        }

        let mut icons = BTreeMap::new();
        if !wanted.is_empty() {
            let keys: Vec<String> = wanted.keys().map(|path| path.as_str().to_string()).collect();
            let (assets, shared) = tokio::try_join!(
                self.assets.find_assets(project, &keys),
                self.shared.find_icons(&self.visibility, &keys),
            )?;

            let tier1: HashMap<&str, &ProjectAsset> = assets
                .iter()
                .filter(|asset| &asset.project_id == project)
                .map(|asset| (asset.file_path.as_str(), asset))
                .collect();
            let tier2: HashMap<&str, &SharedIconRecord> = shared
                .iter()
                .filter(|icon| icon.visibility == self.visibility)
                .map(|icon| (icon.path_hint.as_str(), icon))
                .collect();

            for (path, raw) in wanted {
                let (payload, origin, source) = if let Some(asset) = tier1.get(path.as_str()) {
                    (
                        asset.content_base64.as_str(),
                        PayloadOrigin::ProjectAsset,
                        IconSource::ProjectAsset,
                    )
                } else if let Some(icon) = tier2.get(path.as_str()) {
                    (
                        icon.content_base64.as_str(),
                        PayloadOrigin::SharedIcon,
                        IconSource::SharedStore,
                    )
                } else {
                    missing.push(raw);
                    continue;
                };

                let bytes = decode_payload(payload).map_err(|err| {
                    tracing::error!(path = %raw, ?origin, error = %err, "icon payload does not decode");
                    ResolveError::IconDecode {
                        path: raw.clone(),
                        origin,
                        reason: err.to_string(),
                    }
                })?;
                icons.insert(path, ResolvedIcon { bytes, source });
            }
        }

        if !missing.is_empty() {
            missing.sort();
            tracing::warn!(missing = ?missing, "required icons unresolved");
            return Err(ResolveError::MissingIcons { paths: missing });
        }

        let resolved = ResolvedIcons {
            icons,
            fill: IconFill::default(),
        };
        tracing::info!(
            icons = resolved.len(),
            from_project = resolved.count_from(IconSource::ProjectAsset),
            from_shared = resolved.count_from(IconSource::SharedStore),
            "resolved icons"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Assets(Vec<ProjectAsset>);

    #[async_trait]
    impl ProjectAssetStore for Assets {
        async fn find_assets(
            &self,
            project: &ProjectId,
            paths: &[String],
        ) -> StoreResult<Vec<ProjectAsset>> {
            Ok(self
                .0
                .iter()
                .filter(|a| &a.project_id == project && paths.contains(&a.file_path))
                .cloned()
                .collect())
        }

        async fn list_assets(&self, project: &ProjectId) -> StoreResult<Vec<ProjectAsset>> {
            Ok(self.0.iter().filter(|a| &a.project_id == project).cloned().collect())
        }
    }

    #[derive(Default)]
    struct Shared {
        icons: Vec<SharedIconRecord>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SharedIconStore for Shared {
        async fn find_icons(
            &self,
            visibility: &Visibility,
            paths: &[String],
        ) -> StoreResult<Vec<SharedIconRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Unavailable("shared icons offline".into()));
            }
            Ok(self
                .icons
                .iter()
                .filter(|i| &i.visibility == visibility && paths.contains(&i.path_hint))
                .cloned()
                .collect())
        }
    }

    fn asset(path: &str, bytes: &[u8]) -> ProjectAsset {
        ProjectAsset {
            project_id: ProjectId::from("p1"),
            file_path: path.into(),
            file_type: crate::types::AssetKind::Icon,
            content_base64: STANDARD.encode(bytes),
            mime_type: "image/png".into(),
            file_size: bytes.len() as u64,
            updated_at: Utc::now(),
        }
    }

    fn shared(path: &str, payload: &str) -> SharedIconRecord {
        SharedIconRecord {
            path_hint: path.into(),
            visibility: Visibility::global(),
            content_base64: payload.into(),
            mime: "image/png".into(),
            sizes: vec![],
            hash: String::new(),
            updated_at: Utc::now(),
        }
    }

    fn resolver(assets: Assets, shared: Shared) -> IconResolver {
        IconResolver::new(Arc::new(assets), Arc::new(shared), Visibility::global())
    }

    fn paths(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|p| (*p).to_string()).collect()
    }

    #[tokio::test]
    async fn project_asset_shadows_shared_icon() {
        let resolver = resolver(
            Assets(vec![asset("icons/icon16.png", b"custom")]),
            // The shadowed shared payload is not base64; decoding it would fail.
            Shared {
                icons: vec![shared("icons/icon16.png", "!!!")],
                ..Shared::default()
            },
        );

        let icons = resolver
            .resolve_paths(&ProjectId::from("p1"), &paths(&["icons/icon16.png"]))
            .await
            .unwrap();
        let icon = icons.get("icons/icon16.png").unwrap();
        assert_eq!(icon.bytes, b"custom");
        assert_eq!(icon.source, IconSource::ProjectAsset);
    }

    #[tokio::test]
    async fn shared_store_fills_gaps() {
        let resolver = resolver(
            Assets(vec![asset("icons/icon16.png", b"a")]),
            Shared {
                icons: vec![shared("icons/icon48.png", &STANDARD.encode(b"b"))],
                ..Shared::default()
            },
        );
        let icons = resolver
            .resolve_paths(
                &ProjectId::from("p1"),
                &paths(&["icons/icon16.png", "icons/icon48.png"]),
            )
            .await
            .unwrap();
        assert_eq!(icons.count_from(IconSource::ProjectAsset), 1);
        assert_eq!(icons.count_from(IconSource::SharedStore), 1);
    }

    #[tokio::test]
    async fn reports_every_missing_path_sorted() {
        let resolver = resolver(Assets::default(), Shared::default());
        let err = resolver
            .resolve_paths(
                &ProjectId::from("p1"),
                &paths(&["icons/z.png", "icons/a.png", "/abs.png"]),
            )
            .await
            .unwrap_err();
        match err {
            ResolveError::MissingIcons { paths } => {
                assert_eq!(paths, vec!["/abs.png", "icons/a.png", "icons/z.png"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn other_projects_assets_ignored() {
        let mut foreign = asset("icons/icon16.png", b"x");
        foreign.project_id = ProjectId::from("p2");
        let resolver = resolver(Assets(vec![foreign]), Shared::default());
        let err = resolver
            .resolve_paths(&ProjectId::from("p1"), &paths(&["icons/icon16.png"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingIcons { .. }));
    }

    #[tokio::test]
    async fn undecodable_payload_is_fatal() {
        let resolver = resolver(
            Assets::default(),
            Shared {
                icons: vec![shared("icons/icon48.png", "%%%")],
                ..Shared::default()
            },
        );
        let err = resolver
            .resolve_paths(&ProjectId::from("p1"), &paths(&["icons/icon48.png"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::IconDecode { ref path, origin: PayloadOrigin::SharedIcon, .. }
                if path == "icons/icon48.png"
        ));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let resolver = resolver(
            Assets::default(),
            Shared {
                fail: true,
                ..Shared::default()
            },
        );
        let err = resolver
            .resolve_paths(&ProjectId::from("p1"), &paths(&["icons/a.png"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
    }

    #[tokio::test]
    async fn nothing_required_skips_lookups() {
        let shared = Arc::new(Shared::default());
        let resolver = IconResolver::new(
            Arc::new(Assets::default()),
            shared.clone(),
            Visibility::global(),
        );
        let icons = resolver
            .resolve_paths(&ProjectId::from("p1"), &BTreeSet::new())
            .await
            .unwrap();
        assert!(icons.is_empty());
        assert_eq!(shared.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolve_fills_defaults_first() {
        let bytes = STANDARD.encode(b"png");
        let resolver = resolver(
            Assets::default(),
            Shared {
                icons: ["icons/icon16.png", "icons/icon48.png", "icons/icon128.png"]
                    .iter()
                    .map(|p| shared(p, &bytes))
                    .collect(),
                ..Shared::default()
            },
        );
        let mut manifest = Manifest::parse(r#"{"name": "x"}"#).unwrap();
        let icons = resolver
            .resolve(&ProjectId::from("p1"), &mut manifest, &FileSet::new())
            .await
            .unwrap();
        assert_eq!(icons.len(), 3);
        assert!(icons.fill().icons_reset);
        assert_eq!(manifest.declared_icon_paths().len(), 3);
    }

    #[tokio::test]
    async fn dot_slash_paths_match_stored_icons() {
        let resolver = resolver(
            Assets::default(),
            Shared {
                icons: vec![shared("icons/icon16.png", &STANDARD.encode(b"png"))],
                ..Shared::default()
            },
        );
        let icons = resolver
            .resolve_paths(
                &ProjectId::from("p1"),
                &paths(&["./icons/icon16.png", "icons/icon16.png"]),
            )
            .await
            .unwrap();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons.get("icons/icon16.png").unwrap().bytes, b"png");

        let err = resolver
            .resolve_paths(&ProjectId::from("p1"), &paths(&["./icons/gone.png"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingIcons { ref paths } if paths == &["./icons/gone.png".to_string()]
        ));
    }
}
