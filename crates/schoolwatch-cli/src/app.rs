//! Application wiring for the schoolwatch CLI.
//!
//! Builds the stores, trackers and one refresh coordinator per sync class,
//! and renders their results. All sync policy lives in `schoolwatch-core`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use schoolwatch_core::auth::CredentialStore;
use schoolwatch_core::cache::{CACHE_NAMESPACE, COOLDOWN_NAMESPACE};
use schoolwatch_core::config::Config;
use schoolwatch_core::{
    Clock, CooldownTracker, EmergencyContact, FileStore, KeyValueStore, LocalCacheStore,
    MemoryStore, RealtimeDbClient, Record, RefreshCoordinator, RefreshOutcome, RemoteSource,
    School, SchoolStats, SyncClass, SystemClock, UnconfiguredSource,
};
use tracing::{debug, info, warn};

pub struct App {
    pub config: Config,
    pub cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
    cooldown: CooldownTracker,
    schools: RefreshCoordinator<School>,
    emergency: RefreshCoordinator<EmergencyContact>,
    school_cache: LocalCacheStore<School>,
    emergency_cache: LocalCacheStore<EmergencyContact>,
}

/// Open a namespace on disk, or fall back to a volatile store.
fn open_store(cache_dir: &Path, namespace: &str) -> Arc<dyn KeyValueStore> {
    match FileStore::open(cache_dir, namespace) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(namespace, error = %e, "Failed to open store, changes will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

fn auth_token() -> Option<String> {
    Config::env_auth_token().or_else(|| CredentialStore::get_token().ok())
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache_store = open_store(&cache_dir, CACHE_NAMESPACE);
        let cooldown_store = open_store(&cache_dir, COOLDOWN_NAMESPACE);

        let cooldown = CooldownTracker::new(cooldown_store, Arc::clone(&clock));
        let school_cache = LocalCacheStore::new(Arc::clone(&cache_store), Arc::clone(&clock));
        let emergency_cache = LocalCacheStore::new(cache_store, Arc::clone(&clock));

        let (school_remote, emergency_remote) = Self::remotes(&config)?;
        let policy = config.failed_fetch_policy;

        let schools = RefreshCoordinator::new(
            SyncClass::Schools,
            school_cache.clone(),
            cooldown.clone(),
            school_remote,
        )
        .with_policy(policy);
        let emergency = RefreshCoordinator::new(
            SyncClass::Emergency,
            emergency_cache.clone(),
            cooldown.clone(),
            emergency_remote,
        )
        .with_policy(policy);

        Ok(Self {
            config,
            cache_dir,
            clock,
            cooldown,
            schools,
            emergency,
            school_cache,
            emergency_cache,
        })
    }

    #[allow(clippy::type_complexity)]
    fn remotes(
        config: &Config,
    ) -> Result<(
        Arc<dyn RemoteSource<School>>,
        Arc<dyn RemoteSource<EmergencyContact>>,
    )> {
        let url = match config.database_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                info!("No database URL configured, working from cache only");
                let schools: Arc<dyn RemoteSource<School>> = Arc::new(UnconfiguredSource);
                let emergency: Arc<dyn RemoteSource<EmergencyContact>> =
                    Arc::new(UnconfiguredSource);
                return Ok((schools, emergency));
            }
        };

        let mut client = RealtimeDbClient::new(url)?;
        if let Some(token) = auth_token() {
            client.set_token(token);
        }
        let client = Arc::new(client);
        let schools: Arc<dyn RemoteSource<School>> = client.clone();
        let emergency: Arc<dyn RemoteSource<EmergencyContact>> = client;
        Ok((schools, emergency))
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    pub async fn refresh_schools(&self, force: bool) {
        let outcome = if force {
            self.schools.force_refresh().await
        } else {
            self.schools.smart_refresh().await
        };
        self.report(&self.schools, outcome, print_schools);
    }

    pub async fn refresh_emergency(&self, force: bool) {
        let outcome = if force {
            self.emergency.force_refresh().await
        } else {
            self.emergency.smart_refresh().await
        };
        self.report(&self.emergency, outcome, print_contacts);
    }

    /// Refresh both classes concurrently; each coordinator runs one refresh.
    pub async fn refresh_all(&self, force: bool) {
        let (schools, emergency) = if force {
            tokio::join!(self.schools.force_refresh(), self.emergency.force_refresh())
        } else {
            tokio::join!(self.schools.smart_refresh(), self.emergency.smart_refresh())
        };
        self.report(&self.schools, schools, print_schools);
        self.report(&self.emergency, emergency, print_contacts);
    }

    /// Print an outcome. On cooldown or error the last known list is shown
    /// instead of nothing.
    fn report<R: Record>(
        &self,
        coordinator: &RefreshCoordinator<R>,
        outcome: RefreshOutcome<R>,
        print: fn(&[R]),
    ) {
        let class = coordinator.class();
        match outcome {
            RefreshOutcome::Success { ref records, .. } => {
                println!("[{}] {}", class, outcome.summary());
                print(records);
            }
            RefreshOutcome::Cooldown { .. } | RefreshOutcome::Error { .. } => {
                eprintln!("[{}] {}", class, outcome.summary());
                let cached = coordinator.cached_records();
                if !cached.is_empty() {
                    println!(
                        "[{}] Showing last known data ({})",
                        class,
                        coordinator.cache_info().age_display(self.clock.now_millis())
                    );
                    print(&cached);
                }
            }
        }
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    pub fn list_schools(&self, search: Option<&str>, with_stats: bool) {
        let mut schools = self.school_cache.load();
        if schools.is_empty() {
            println!("No cached schools. Run `schoolwatch refresh` first.");
            return;
        }
        if let Some(query) = search {
            schools.retain(|school| school.matches(query));
            if schools.is_empty() {
                println!("No schools match \"{}\"", query.trim());
                return;
            }
        }
        print_schools(&schools);
        if with_stats {
            print_stats(&SchoolStats::from_records(&schools));
        }
    }

    pub fn status(&self) {
        let now = self.clock.now_millis();
        println!("Cache directory: {}", self.cache_dir.display());
        println!(
            "Database: {}",
            self.config.database_url.as_deref().unwrap_or("(not configured)")
        );
        println!("Failed fetch policy: {}", self.config.failed_fetch_policy);
        let token_source = if Config::env_auth_token().is_some() {
            "environment"
        } else if CredentialStore::has_token() {
            "keychain"
        } else {
            "none"
        };
        println!("Auth token: {}", token_source);
        println!();

        let school_info = self.school_cache.info();
        let emergency_info = self.emergency_cache.info();
        let rows = [
            (SyncClass::Schools, school_info, self.school_cache.load().len()),
            (
                SyncClass::Emergency,
                emergency_info,
                self.emergency_cache.load().len(),
            ),
        ];

        for (class, info, count) in rows {
            let status = self.cooldown.status(class);
            println!("{}:", class);
            println!(
                "  cache:    {} records, last synced {}{}",
                count,
                info.age_display(now),
                if info.is_expired { " (expired)" } else { "" }
            );
            if status.can_sync {
                println!("  sync:     allowed");
            } else {
                println!("  sync:     cooling down, {} min remaining", status.minutes_remaining);
            }
        }
    }

    // =========================================================================
    // Administration
    // =========================================================================

    pub fn reset_cooldown(&self, class: Option<SyncClass>) {
        match class {
            Some(class) => self.cooldown.reset(&[class]),
            None => self.cooldown.reset_all(),
        }
        println!("Cooldown reset");
    }

    pub fn clear_cache(&self) {
        self.school_cache.clear();
        self.emergency_cache.clear();
        println!("Cache cleared");
    }

    pub fn expire_cache(&self) {
        self.school_cache.expire();
        self.emergency_cache.expire();
        println!("Cache marked as expired");
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn print_schools(schools: &[School]) {
    for school in schools {
        println!(
            "{:>4}  {:<48}  {:<8}  {:>5} students  {:>3}% present",
            school.school_number,
            school.display_name(),
            school.school_status,
            school.total_students,
            school.attendance_percentage()
        );
        if !school.headmaster_name.is_empty() || !school.headmaster_mobile.is_empty() {
            println!(
                "      headmaster: {} {}",
                school.headmaster_name, school.headmaster_mobile
            );
        }
        if let Some(url) = school.maps_url() {
            println!("      map: {}", url);
        }
    }
}

fn print_contacts(contacts: &[EmergencyContact]) {
    for contact in contacts {
        let area = if contact.is_national() {
            "national"
        } else {
            contact.area.as_str()
        };
        println!("  {:<32}  {:<16}  {}", contact.label, contact.number, area);
    }
}

fn print_stats(stats: &SchoolStats) {
    println!();
    println!("Schools:            {}", stats.school_count);
    println!("Total students:     {}", stats.total_students);
    println!("Present today:      {}", stats.total_attendance);
    println!("Average attendance: {}%", stats.average_attendance_percentage);
}
