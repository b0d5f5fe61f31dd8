// INICIO DEL ARCHIVO [apps/orchestrator/src/bin/seed.rs]
//! =================================================================
//! APARATO: GENESIS FORGE SEEDER (V8.1 - DRIFT PROFILES)
//! CLASIFICACIÓN: INFRASTRUCTURE UTILITY (ESTRATO L3)
//! RESPONSABILIDAD: SEMBRADO REPLICABLE DE PERFILES DE DERIVA
//! =================================================================

use deriva_domain_models::{BehaviorRecord, BehaviorState, ConflictRecord, Intent, Polarity};
use deriva_infra_db::repositories::{BehaviorRepository, ConflictRepository};
use deriva_infra_db::LedgerClient;
use deriva_shared_clock::SECONDS_PER_DAY;
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info};

#[allow(clippy::too_many_arguments)]
fn behavior(
    user: &str,
    id: &str,
    target: &str,
    context: &str,
    polarity: Polarity,
    credibility: f64,
    reinforcement: i64,
    state: BehaviorState,
    created_days_ago: i64,
    seen_days_ago: i64,
    now: i64,
) -> BehaviorRecord {
    BehaviorRecord {
        user_id: user.into(),
        behavior_id: id.into(),
        target: target.into(),
        intent: Intent::Preference,
        context: context.into(),
        polarity,
        credibility,
        reinforcement_count: reinforcement,
        state,
        created_at: now - created_days_ago * SECONDS_PER_DAY,
        last_seen_at: now - seen_days_ago * SECONDS_PER_DAY,
        snapshot_updated_at: now,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,deriva_infra_db=debug")
        .with_target(false)
        .init();

    info!("💠 [GENESIS_FORGE]: Initiating drift profile hydration...");

    let database_url = std::env::var("DATABASE_URL")
        .expect("CRITICAL_FAULT: DATABASE_URL is missing in environment.");
    let database_token = std::env::var("DATABASE_AUTH_TOKEN").ok();

    let database_client = match LedgerClient::connect(&database_url, database_token).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ [FORGE_FAULT]: UPLINK_COLLAPSE: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };

    let behaviors = BehaviorRepository::new(database_client.clone());
    let conflicts = ConflictRepository::new(database_client);
    let now = Utc::now().timestamp();

    // --- PERFIL 1: EMERGENCIA (python débil -> ráfaga pytorch) ---
    info!("🌱 [FORGE]: Planting emergence profile [seed_user_emergence]...");
    behaviors
        .upsert(&behavior(
            "seed_user_emergence", "seed_em_python", "python", "general",
            Polarity::Positive, 0.7, 1, BehaviorState::Active, 45, 45, now,
        ))
        .await?;
    for ordinal in 1..=5i64 {
        behaviors
            .upsert(&behavior(
                "seed_user_emergence",
                &format!("seed_em_pytorch_{}", ordinal),
                "pytorch",
                "general",
                Polarity::Positive,
                0.85,
                25,
                BehaviorState::Active,
                ordinal,
                ordinal,
                now,
            ))
            .await?;
    }

    // --- PERFIL 2: ABANDONO (react reforzado -> silencio, vive vue) ---
    info!("🥀 [FORGE]: Planting abandonment profile [seed_user_abandonment]...");
    behaviors
        .upsert(&behavior(
            "seed_user_abandonment", "seed_ab_react_1", "react", "frontend",
            Polarity::Positive, 0.8, 7, BehaviorState::Active, 50, 42, now,
        ))
        .await?;
    behaviors
        .upsert(&behavior(
            "seed_user_abandonment", "seed_ab_react_2", "react", "frontend",
            Polarity::Positive, 0.8, 5, BehaviorState::Active, 48, 40, now,
        ))
        .await?;
    for ordinal in 1..=5i64 {
        behaviors
            .upsert(&behavior(
                "seed_user_abandonment",
                &format!("seed_ab_vue_{}", ordinal),
                "vue",
                "frontend",
                Polarity::Positive,
                0.8,
                3,
                BehaviorState::Active,
                ordinal + 2,
                ordinal,
                now,
            ))
            .await?;
    }

    // --- PERFIL 3: REVERSIÓN (remote_work positivo -> negativo) ---
    info!("🔄 [FORGE]: Planting reversal profile [seed_user_reversal]...");
    behaviors
        .upsert(&behavior(
            "seed_user_reversal", "seed_rv_old", "remote_work", "general",
            Polarity::Positive, 0.85, 6, BehaviorState::Superseded, 45, 35, now,
        ))
        .await?;
    behaviors
        .upsert(&behavior(
            "seed_user_reversal", "seed_rv_new", "remote_work", "general",
            Polarity::Negative, 0.9, 4, BehaviorState::Active, 10, 2, now,
        ))
        .await?;
    for ordinal in 1..=4i64 {
        behaviors
            .upsert(&behavior(
                "seed_user_reversal",
                &format!("seed_rv_filler_{}", ordinal),
                &format!("seed_topic_{}", ordinal),
                "misc",
                Polarity::Neutral,
                0.5,
                1,
                BehaviorState::Active,
                12,
                9,
                now,
            ))
            .await?;
    }
    conflicts
        .insert(&ConflictRecord {
            user_id: "seed_user_reversal".into(),
            conflict_id: "seed_conf_remote_work".into(),
            behavior_id_1: "seed_rv_old".into(),
            behavior_id_2: "seed_rv_new".into(),
            conflict_type: "TARGET_POLARITY".into(),
            resolution_status: "USER_RESOLVED".into(),
            old_polarity: Some(Polarity::Positive),
            new_polarity: Some(Polarity::Negative),
            old_target: None,
            new_target: None,
            created_at: now - 10 * SECONDS_PER_DAY,
        })
        .await?;

    info!("✅ [GENESIS_COMPLETE]: Drift profiles planted. Ledger ready for scans.");
    Ok(())
}
// FIN DEL ARCHIVO [apps/orchestrator/src/bin/seed.rs]
