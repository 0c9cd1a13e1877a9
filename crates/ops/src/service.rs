//! The marketplace service: composes the remote store, cache, catalog,
//! access policy, and token protocol into the operations the dispatch layer
//! exposes.
//!
//! Reads go through the cache; writes go straight to the remote store and
//! invalidate the affected keys afterwards. Multi-file mutations apply one
//! optimistic write per file and report partial failure instead of rolling
//! back.

use std::sync::Arc;

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    skilldock_access::{AccessEvaluator, AccessPolicy},
    skilldock_cache::{KvCache, MemoryCache, cached, ttl},
    skilldock_catalog::{
        Catalog,
        PackageManifest,
        RegistryDoc,
        RegistryEntry,
        SkillRecord,
        Version,
        VersionBump,
        build_catalog,
        count_skill_dirs,
        frontmatter,
        layout,
        types::DEFAULT_VERSION,
    },
    skilldock_common::{Error, Result, UserIdentity},
    skilldock_remote::{FileContent, GitHubStore, RemoteStore, types::is_binary_path},
    skilldock_tokens::{TokenKind, TokenService},
    tracing::{info, warn},
};

use crate::{
    config::MarketplaceConfig,
    paths,
    types::{
        BumpReport,
        DeleteReport,
        FileEdit,
        FileFailure,
        InstalledSkill,
        PublishRequest,
        SaveReport,
        SaveRequest,
        SkillBundle,
        SkillDetails,
        SkillFile,
        SkillSummary,
        SkillTokenPayload,
        TokenGrant,
        UpdateCheck,
        Whoami,
    },
};

pub struct Marketplace {
    store: Arc<dyn RemoteStore>,
    writer: Arc<dyn RemoteStore>,
    cache: Arc<dyn KvCache>,
    tokens: TokenService,
    config: MarketplaceConfig,
}

impl Marketplace {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        writer: Arc<dyn RemoteStore>,
        cache: Arc<dyn KvCache>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            store,
            writer,
            tokens: TokenService::new(cache.clone()),
            cache,
            config,
        }
    }

    /// One backend for both reads and writes.
    pub fn single(
        store: Arc<dyn RemoteStore>,
        cache: Arc<dyn KvCache>,
        config: MarketplaceConfig,
    ) -> Self {
        Self::new(store.clone(), store, cache, config)
    }

    /// Production wiring: GitHub-backed stores from the config, split so the
    /// write credential is only ever attached to mutations.
    pub fn github(config: MarketplaceConfig) -> Self {
        let reader = GitHubStore::with_api_base(
            config.api_base.clone(),
            config.repo.clone(),
            config.read_token.clone().unwrap_or_default(),
        );
        let writer = GitHubStore::with_api_base(
            config.api_base.clone(),
            config.repo.clone(),
            config.effective_write_token().unwrap_or_default(),
        );
        Self::new(
            Arc::new(reader),
            Arc::new(writer),
            Arc::new(MemoryCache::new()),
            config,
        )
    }

    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    // ── Cached snapshots ────────────────────────────────────────────────────

    async fn catalog(&self) -> Result<Catalog> {
        let key = format!("catalog:{}", self.config.repo);
        cached(self.cache.as_ref(), &key, ttl::CATALOG, || async {
            build_catalog(self.store.as_ref(), &self.config.registry_path).await
        })
        .await
    }

    /// Current access policy. Absent document means the default policy.
    async fn policy(&self) -> Result<AccessPolicy> {
        let key = format!("access:{}", self.config.repo);
        cached(self.cache.as_ref(), &key, ttl::ACCESS_POLICY, || async {
            let content = match self.store.read_file(&self.config.access_path).await {
                Ok(content) => content,
                Err(e) if e.is_not_found() => return Ok(AccessPolicy::default()),
                Err(e) => return Err(e),
            };
            let text = content
                .as_text()
                .ok_or_else(|| Error::invalid("access policy document is binary"))?;
            serde_json::from_str(text)
                .map_err(|e| Error::invalid(format!("malformed access policy: {e}")))
        })
        .await
    }

    async fn manifest(&self, package: &str) -> Result<Option<PackageManifest>> {
        let key = format!("manifest:{}:{package}", self.config.repo);
        cached(self.cache.as_ref(), &key, ttl::MANIFEST, || async {
            match self.store.read_file(&layout::manifest_path(package)).await {
                Ok(content) => Ok(content
                    .as_text()
                    .and_then(|text| serde_json::from_str(text).ok())),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn bundle_files(&self, package: &str, dir: &str, version: &str) -> Result<Vec<SkillFile>> {
        let key = format!("tree:{}:{package}:{dir}:{version}", self.config.repo);
        cached(self.cache.as_ref(), &key, ttl::FILE_TREE, || async {
            let files = self
                .store
                .read_directory_recursive(&layout::skill_dir(package, dir))
                .await?;
            Ok(files.into_iter().map(SkillFile::from).collect::<Vec<_>>())
        })
        .await
    }

    /// Drop every cache entry a mutation of `package` could have staled.
    /// The tree prefix matters because a save changes content without
    /// changing the version embedded in the tree key.
    async fn invalidate_package(&self, package: &str) {
        let repo = &self.config.repo;
        self.cache.delete(&format!("catalog:{repo}")).await;
        self.cache.delete(&format!("manifest:{repo}:{package}")).await;
        self.cache
            .delete_by_prefix(&format!("tree:{repo}:{package}:"))
            .await;
    }

    /// Find a skill the user may read. Unreadable and absent skills are
    /// indistinguishable to the caller.
    fn find_visible<'a>(
        catalog: &'a Catalog,
        eval: &AccessEvaluator<'_>,
        name: &str,
    ) -> Result<&'a SkillRecord> {
        catalog
            .find(name)
            .filter(|record| eval.can_read(&record.name))
            .ok_or_else(|| Error::not_found(format!("skill '{name}'")))
    }

    // ── Read operations ─────────────────────────────────────────────────────

    pub async fn list_skills(&self, user: &UserIdentity) -> Result<Vec<SkillSummary>> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());

        Ok(catalog
            .skills
            .iter()
            .filter(|record| eval.can_read(&record.name))
            .map(|record| SkillSummary::from_record(record, eval.can_write(&record.name)))
            .collect())
    }

    pub async fn get_skill_details(&self, user: &UserIdentity, name: &str) -> Result<SkillDetails> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        let record = Self::find_visible(&catalog, &eval, name)?;

        let declaration_path = layout::declaration_path(&record.package, &record.dir_name);
        let content = self.store.read_file(&declaration_path).await?;
        let text = content
            .as_text()
            .ok_or_else(|| Error::invalid(format!("'{declaration_path}' is binary")))?;
        let declaration = frontmatter::parse_declaration(text)?;
        let manifest = self.manifest(&record.package).await?;

        Ok(SkillDetails {
            summary: SkillSummary::from_record(record, eval.can_write(&record.name)),
            dir_name: record.dir_name.clone(),
            keywords: record.keywords.clone(),
            license: manifest.and_then(|m| m.license),
            body: declaration.body,
        })
    }

    pub async fn fetch_skill_files(&self, user: &UserIdentity, name: &str) -> Result<SkillBundle> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        let record = Self::find_visible(&catalog, &eval, name)?;

        let files = self
            .bundle_files(&record.package, &record.dir_name, &record.version)
            .await?;
        Ok(SkillBundle {
            skill: record.name.clone(),
            package: record.package.clone(),
            version: record.version.clone(),
            files,
        })
    }

    pub async fn check_updates(
        &self,
        user: &UserIdentity,
        installed: &[InstalledSkill],
    ) -> Result<Vec<UpdateCheck>> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());

        Ok(installed
            .iter()
            .map(|skill| {
                let available = catalog
                    .find(&skill.name)
                    .filter(|record| eval.can_read(&record.name))
                    .map(|record| record.version.clone());
                let update_available = available
                    .as_deref()
                    .is_some_and(|v| skilldock_catalog::semver::update_available(&skill.version, v));
                UpdateCheck {
                    name: skill.name.clone(),
                    installed: skill.version.clone(),
                    available,
                    update_available,
                }
            })
            .collect())
    }

    pub async fn whoami(&self, user: &UserIdentity) -> Result<Whoami> {
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        Ok(Whoami {
            user_id: user.user_id(),
            provider: user.provider.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            editor: eval.is_editor(),
        })
    }

    // ── Mutations ───────────────────────────────────────────────────────────

    /// Save a batch of files into one skill.
    ///
    /// Path validation and declaration-delete rejection are all-or-nothing:
    /// one bad entry fails the batch before anything is written. After that,
    /// each file is an independent optimistic write; failures land in the
    /// report, already-applied files stay applied.
    pub async fn save_skill(&self, user: &UserIdentity, req: SaveRequest) -> Result<SaveReport> {
        if req.files.is_empty() {
            return Err(Error::invalid("save batch is empty"));
        }
        paths::validate_batch(req.files.iter().map(|f| f.path.as_str()))?;
        for file in &req.files {
            if file.content.is_empty() && file.path == layout::DECLARATION_FILE {
                return Err(Error::invalid("SKILL.md may not be deleted"));
            }
        }

        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());

        let (package, dir, created) = match catalog.find(&req.skill) {
            Some(record) => {
                if !eval.can_write(&record.name) {
                    return Err(Error::unauthorized(format!(
                        "no write access to '{}'",
                        req.skill
                    )));
                }
                (record.package.clone(), record.dir_name.clone(), false)
            },
            None => {
                self.validate_new_skill(&eval, &req)?;
                let package = req.group.clone().unwrap_or_else(|| req.skill.clone());
                (package, req.skill.clone(), true)
            },
        };

        if created {
            self.ensure_manifest(&package, &req).await?;
        }

        let skill_root = layout::skill_dir(&package, &dir);
        let mut report = SaveReport {
            skill: req.skill.clone(),
            package: package.clone(),
            created,
            ..SaveReport::default()
        };

        for file in &req.files {
            let full_path = format!("{skill_root}/{}", file.path);
            let message = format!("save {}: {}", req.skill, file.path);
            if file.content.is_empty() {
                self.delete_one(&full_path, &message, file, &mut report)
                    .await;
            } else {
                self.write_one(&full_path, &message, file, &mut report).await;
            }
        }

        self.invalidate_package(&package).await;
        info!(
            user = %user.user_id(),
            skill = %req.skill,
            written = report.written.len(),
            deleted = report.deleted.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "skill saved"
        );
        Ok(report)
    }

    fn validate_new_skill(&self, eval: &AccessEvaluator<'_>, req: &SaveRequest) -> Result<()> {
        if !eval.is_editor() {
            return Err(Error::unauthorized("creating a skill requires editor rights"));
        }
        if !frontmatter::validate_name(&req.skill) {
            return Err(Error::invalid(format!(
                "invalid skill name '{}': use lowercase letters, digits, hyphens",
                req.skill
            )));
        }
        if let Some(group) = &req.group
            && !frontmatter::validate_name(group)
        {
            return Err(Error::invalid(format!(
                "invalid group name '{group}': use lowercase letters, digits, hyphens"
            )));
        }
        let declaration = req
            .files
            .iter()
            .find(|f| f.path == layout::DECLARATION_FILE)
            .ok_or_else(|| Error::invalid("a new skill must include SKILL.md"))?;
        let parsed = frontmatter::parse_declaration(&declaration.content)?;
        let named = parsed
            .frontmatter
            .name
            .as_deref()
            .is_some_and(|n| !n.is_empty());
        let described = parsed
            .frontmatter
            .description
            .as_deref()
            .is_some_and(|d| !d.is_empty());
        if !named || !described {
            return Err(Error::invalid(
                "new skill frontmatter must set name and description",
            ));
        }
        Ok(())
    }

    /// Create the package manifest for a brand-new package.
    async fn ensure_manifest(&self, package: &str, req: &SaveRequest) -> Result<()> {
        let path = layout::manifest_path(package);
        if self.store.file_exists(&path).await? {
            return Ok(());
        }
        let description = req
            .files
            .iter()
            .find(|f| f.path == layout::DECLARATION_FILE)
            .and_then(|f| frontmatter::parse_declaration(&f.content).ok())
            .and_then(|d| d.frontmatter.description);
        let manifest = PackageManifest {
            name: package.to_string(),
            version: Some(DEFAULT_VERSION.to_string()),
            description,
            author: None,
            license: None,
            keywords: Vec::new(),
        };
        let text = serde_json::to_string_pretty(&manifest)?;
        self.writer
            .upsert_file(&path, &text.into(), &format!("create package {package}"))
            .await?;
        Ok(())
    }

    async fn write_one(
        &self,
        full_path: &str,
        message: &str,
        file: &FileEdit,
        report: &mut SaveReport,
    ) {
        let content = match decode_edit(file) {
            Ok(content) => content,
            Err(e) => {
                report.failed.push(FileFailure {
                    path: file.path.clone(),
                    failure: (&e).into(),
                });
                return;
            },
        };

        // Diff before write: identical remote content means no-op.
        match self.store.read_file(full_path).await {
            Ok(current) if current == content => {
                report.unchanged.push(file.path.clone());
                return;
            },
            Ok(_) => {},
            Err(e) if e.is_not_found() => {},
            Err(e) => {
                report.failed.push(FileFailure {
                    path: file.path.clone(),
                    failure: (&e).into(),
                });
                return;
            },
        }

        match self.writer.upsert_file(full_path, &content, message).await {
            Ok(_) => report.written.push(file.path.clone()),
            Err(e) => report.failed.push(FileFailure {
                path: file.path.clone(),
                failure: (&e).into(),
            }),
        }
    }

    async fn delete_one(
        &self,
        full_path: &str,
        message: &str,
        file: &FileEdit,
        report: &mut SaveReport,
    ) {
        match self.store.version_tag(full_path).await {
            // Deleting a file that is already gone is a no-op.
            Err(e) if e.is_not_found() => report.unchanged.push(file.path.clone()),
            Err(e) => report.failed.push(FileFailure {
                path: file.path.clone(),
                failure: (&e).into(),
            }),
            Ok(tag) => match self.writer.delete_file(full_path, message, &tag).await {
                Ok(()) => report.deleted.push(file.path.clone()),
                Err(e) => report.failed.push(FileFailure {
                    path: file.path.clone(),
                    failure: (&e).into(),
                }),
            },
        }
    }

    /// Delete a skill. When it is the package's last skill directory (a
    /// structural count that tolerates malformed declarations), the whole
    /// package and its registry entry go with it.
    pub async fn delete_skill(
        &self,
        user: &UserIdentity,
        name: &str,
        confirm: bool,
    ) -> Result<DeleteReport> {
        if !confirm {
            return Err(Error::invalid("delete requires confirmation"));
        }

        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        let record = Self::find_visible(&catalog, &eval, name)?.clone();
        if !eval.can_write(&record.name) {
            return Err(Error::unauthorized(format!("no write access to '{name}'")));
        }

        let remaining = count_skill_dirs(self.store.as_ref(), &record.package).await?;
        let package_removed = remaining <= 1;
        let target = if package_removed {
            layout::package_dir(&record.package)
        } else {
            layout::skill_dir(&record.package, &record.dir_name)
        };

        let outcome = self
            .writer
            .delete_directory(&target, &format!("delete skill {name}"))
            .await?;
        if !outcome.is_complete() {
            warn!(
                skill = name,
                failed = outcome.failed.len(),
                "partial delete, some files remain"
            );
        }

        let registry_entry_removed = if package_removed {
            self.remove_registry_entry(&record.package).await?
        } else {
            false
        };

        self.invalidate_package(&record.package).await;
        info!(
            user = %user.user_id(),
            skill = name,
            package = %record.package,
            package_removed,
            "skill deleted"
        );
        Ok(DeleteReport {
            skill: name.to_string(),
            package: record.package,
            package_removed,
            registry_entry_removed,
            deleted: outcome.deleted,
            failed: outcome.failed,
        })
    }

    /// Publish a skill's package to the registry. Editor-only.
    pub async fn publish_skill(
        &self,
        user: &UserIdentity,
        req: PublishRequest,
    ) -> Result<RegistryEntry> {
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        if !eval.is_editor() {
            return Err(Error::unauthorized("publishing requires editor rights"));
        }

        let catalog = self.catalog().await?;
        let record = Self::find_visible(&catalog, &eval, &req.skill)?.clone();

        let (mut registry, tag) = self.load_registry_with_tag().await?;
        if registry.find(&record.package).is_some() {
            return Err(Error::conflict(format!(
                "package '{}' is already published",
                record.package
            )));
        }

        let entry = RegistryEntry {
            name: record.package.clone(),
            source: layout::package_dir(&record.package),
            description: Some(req.description),
            version: Some(record.version.clone()),
            author: record.author.clone(),
            category: req.category,
            tags: req.tags,
            keywords: record.keywords.clone(),
        };
        registry.packages.push(entry.clone());
        self.store_registry(&registry, tag.as_deref(), &format!("publish {}", record.package))
            .await?;

        self.invalidate_package(&record.package).await;
        info!(
            user = %user.user_id(),
            skill = %req.skill,
            package = %record.package,
            "package published"
        );
        Ok(entry)
    }

    /// Bump the package version. Manifest and registry entry are updated as
    /// two independent writes, not one transaction.
    pub async fn bump_version(
        &self,
        user: &UserIdentity,
        name: &str,
        bump: VersionBump,
    ) -> Result<BumpReport> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        let record = Self::find_visible(&catalog, &eval, name)?.clone();
        if !eval.can_write(&record.name) {
            return Err(Error::unauthorized(format!("no write access to '{name}'")));
        }
        if !record.published {
            return Err(Error::invalid(format!(
                "'{name}' is not published; publish before bumping"
            )));
        }

        let current: Version = record.version.parse()?;
        let next = current.bumped(bump).to_string();

        let manifest_updated = self
            .bump_manifest(&record.package, &next)
            .await?;

        let (mut registry, tag) = self.load_registry_with_tag().await?;
        let registry_updated = match registry.find_mut(&record.package) {
            Some(entry) => {
                entry.version = Some(next.clone());
                self.store_registry(
                    &registry,
                    tag.as_deref(),
                    &format!("bump {} to {next}", record.package),
                )
                .await?;
                true
            },
            None => false,
        };

        self.invalidate_package(&record.package).await;
        info!(
            user = %user.user_id(),
            skill = name,
            previous = %record.version,
            version = %next,
            "version bumped"
        );
        Ok(BumpReport {
            skill: name.to_string(),
            package: record.package,
            previous: record.version,
            version: next,
            manifest_updated,
            registry_updated,
        })
    }

    async fn bump_manifest(&self, package: &str, next: &str) -> Result<bool> {
        let path = layout::manifest_path(package);
        let tag = match self.store.version_tag(&path).await {
            Ok(tag) => tag,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        let content = self.store.read_file(&path).await?;
        let Some(text) = content.as_text() else {
            return Err(Error::invalid(format!("manifest at '{path}' is binary")));
        };
        let mut manifest: PackageManifest = serde_json::from_str(text)
            .map_err(|e| Error::invalid(format!("malformed manifest for '{package}': {e}")))?;
        manifest.version = Some(next.to_string());
        let text = serde_json::to_string_pretty(&manifest)?;
        self.writer
            .update_file(&path, &text.into(), &format!("bump {package} to {next}"), &tag)
            .await?;
        Ok(true)
    }

    // ── Tokens ──────────────────────────────────────────────────────────────

    pub async fn issue_install_token(
        &self,
        user: &UserIdentity,
        name: &str,
    ) -> Result<TokenGrant> {
        let payload = self.skill_token_payload(user, name, false).await?;
        let token = self.tokens.issue(TokenKind::Install, &payload).await?;
        let command = format!(
            "curl -fsSL {}/install/{token} | bash",
            self.config.connector_url.trim_end_matches('/')
        );
        info!(user = %user.user_id(), skill = name, "install token issued");
        Ok(TokenGrant {
            token,
            expires_in_secs: self.tokens.ttl().as_secs(),
            command: Some(command),
        })
    }

    pub async fn redeem_install_token(&self, token: &str) -> Result<SkillBundle> {
        let payload: SkillTokenPayload = self.tokens.redeem(TokenKind::Install, token).await?;
        info!(user = %payload.user_id, skill = %payload.skill, "install token redeemed");
        self.bundle_for(payload).await
    }

    pub async fn issue_edit_token(&self, user: &UserIdentity, name: &str) -> Result<TokenGrant> {
        let payload = self.skill_token_payload(user, name, true).await?;
        let token = self.tokens.issue(TokenKind::Edit, &payload).await?;
        info!(user = %user.user_id(), skill = name, "edit token issued");
        Ok(TokenGrant {
            token,
            expires_in_secs: self.tokens.ttl().as_secs(),
            command: None,
        })
    }

    pub async fn redeem_edit_token(&self, token: &str) -> Result<SkillBundle> {
        let payload: SkillTokenPayload = self.tokens.redeem(TokenKind::Edit, token).await?;
        info!(user = %payload.user_id, skill = %payload.skill, "edit token redeemed");
        self.bundle_for(payload).await
    }

    /// Generic bearer-session token carrying the full identity.
    pub async fn issue_api_token(&self, user: &UserIdentity) -> Result<TokenGrant> {
        let token = self.tokens.issue(TokenKind::Api, user).await?;
        info!(user = %user.user_id(), "api token issued");
        Ok(TokenGrant {
            token,
            expires_in_secs: self.tokens.ttl().as_secs(),
            command: None,
        })
    }

    pub async fn redeem_api_token(&self, token: &str) -> Result<UserIdentity> {
        self.tokens.redeem(TokenKind::Api, token).await
    }

    async fn skill_token_payload(
        &self,
        user: &UserIdentity,
        name: &str,
        needs_write: bool,
    ) -> Result<SkillTokenPayload> {
        let catalog = self.catalog().await?;
        let policy = self.policy().await?;
        let eval = AccessEvaluator::new(&policy, user.user_id());
        let record = Self::find_visible(&catalog, &eval, name)?;
        if needs_write && !eval.can_write(&record.name) {
            return Err(Error::unauthorized(format!("no write access to '{name}'")));
        }
        Ok(SkillTokenPayload {
            user_id: user.user_id(),
            skill: record.name.clone(),
            package: record.package.clone(),
            dir: record.dir_name.clone(),
            version: record.version.clone(),
        })
    }

    async fn bundle_for(&self, payload: SkillTokenPayload) -> Result<SkillBundle> {
        let files = self
            .bundle_files(&payload.package, &payload.dir, &payload.version)
            .await?;
        Ok(SkillBundle {
            skill: payload.skill,
            package: payload.package,
            version: payload.version,
            files,
        })
    }

    // ── Registry read-modify-write ──────────────────────────────────────────

    /// Fresh (uncached) registry read with its version tag. Absent document
    /// reads as the empty default with no tag.
    async fn load_registry_with_tag(&self) -> Result<(RegistryDoc, Option<String>)> {
        let path = &self.config.registry_path;
        let tag = match self.store.version_tag(path).await {
            Ok(tag) => tag,
            Err(e) if e.is_not_found() => return Ok((RegistryDoc::default(), None)),
            Err(e) => return Err(e),
        };
        let content = self.store.read_file(path).await?;
        let text = content
            .as_text()
            .ok_or_else(|| Error::invalid("registry document is binary"))?;
        let doc = serde_json::from_str(text)
            .map_err(|e| Error::invalid(format!("malformed registry document: {e}")))?;
        Ok((doc, Some(tag)))
    }

    async fn store_registry(
        &self,
        registry: &RegistryDoc,
        tag: Option<&str>,
        message: &str,
    ) -> Result<()> {
        let text = serde_json::to_string_pretty(registry)?;
        let content = FileContent::from(text);
        match tag {
            Some(tag) => {
                self.writer
                    .update_file(&self.config.registry_path, &content, message, tag)
                    .await?;
            },
            None => {
                self.writer
                    .create_file(&self.config.registry_path, &content, message)
                    .await?;
            },
        }
        Ok(())
    }

    async fn remove_registry_entry(&self, package: &str) -> Result<bool> {
        let (mut registry, tag) = self.load_registry_with_tag().await?;
        if !registry.remove(package) {
            return Ok(false);
        }
        self.store_registry(&registry, tag.as_deref(), &format!("unpublish {package}"))
            .await?;
        Ok(true)
    }
}

/// Decode an edit into store content: binary-extension paths carry base64.
fn decode_edit(file: &FileEdit) -> Result<FileContent> {
    if is_binary_path(&file.path) {
        let bytes = STANDARD
            .decode(file.content.as_bytes())
            .map_err(|e| Error::invalid(format!("'{}' expects base64 content: {e}", file.path)))?;
        Ok(FileContent::Binary(bytes))
    } else {
        Ok(FileContent::Text(file.content.clone()))
    }
}
