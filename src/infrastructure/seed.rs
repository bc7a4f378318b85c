use crate::entities::{prelude::*, *};
use crate::services::lead_service::{LeadService, NewLead};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::{info, warn};
use uuid::Uuid;

/// Seed a first admin account (and optional demo leads) on an empty database.
pub async fn seed_initial_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    if Users::find().count(db).await? > 0 {
        return Ok(());
    }

    info!("🌱 Seeding initial data...");

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    if admin_password == "admin123" {
        warn!("⚠️  Seeding admin with the default password; set SEED_ADMIN_PASSWORD");
    }

    create_user(db, "Admin User", &admin_email, &admin_password, "admin").await?;
    create_user(db, "Regular User", "user@example.com", "user123", "user").await?;

    let seed_demo = std::env::var("SEED_DEMO_DATA")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);
    if seed_demo {
        seed_demo_leads(db).await?;
    }

    Ok(())
}

async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<users::Model> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash: {}", e))?
        .to_string();

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
    };
    Ok(user.insert(db).await?)
}

async fn seed_demo_leads(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🌱 Seeding demo leads...");

    let samples = [
        NewLead {
            submission_id: format!("sub_{}_1", Utc::now().timestamp_millis()),
            project_goal: "E-commerce Website".to_string(),
            project_description: Some(
                "Need a modern e-commerce platform for selling handmade jewelry".to_string(),
            ),
            project_timeline: "Within 3 months".to_string(),
            estimated_budget: Some(15_000),
            project_scope: vec![
                "web-development".to_string(),
                "e-commerce".to_string(),
                "payment-integration".to_string(),
                "mobile-responsive".to_string(),
            ],
            attachments: vec![],
            contact_name: "Sarah Johnson".to_string(),
            contact_email: "sarah@artisanjewelry.com".to_string(),
            contact_phone: Some("+1-555-0123".to_string()),
            company_name: Some("Artisan Jewelry Co.".to_string()),
            notes: Some("Initial contact - very interested, budget confirmed".to_string()),
            lead_score: 85,
            source: Some("website".to_string()),
            ip_address: None,
            user_agent: None,
        },
        NewLead {
            submission_id: format!("sub_{}_2", Utc::now().timestamp_millis()),
            project_goal: "Mobile App Development".to_string(),
            project_description: Some("Fitness tracking app with social features".to_string()),
            project_timeline: "Within 6 months".to_string(),
            estimated_budget: Some(50_000),
            project_scope: vec![
                "mobile-app".to_string(),
                "ios".to_string(),
                "android".to_string(),
                "backend-api".to_string(),
                "user-authentication".to_string(),
            ],
            attachments: vec![],
            contact_name: "Mike Chen".to_string(),
            contact_email: "mike@fittrack.com".to_string(),
            contact_phone: Some("+1-555-0124".to_string()),
            company_name: Some("FitTrack Solutions".to_string()),
            notes: Some("Had discovery call - strong technical requirements".to_string()),
            lead_score: 92,
            source: Some("website".to_string()),
            ip_address: None,
            user_agent: None,
        },
        NewLead {
            submission_id: format!("sub_{}_3", Utc::now().timestamp_millis()),
            project_goal: "Website Redesign".to_string(),
            project_description: Some("Modernize existing corporate website".to_string()),
            project_timeline: "Within 2 months".to_string(),
            estimated_budget: Some(8_000),
            project_scope: vec![
                "web-development".to_string(),
                "ui-ux-design".to_string(),
                "content-management".to_string(),
            ],
            attachments: vec![],
            contact_name: "Jennifer Davis".to_string(),
            contact_email: "j.davis@globaltech.com".to_string(),
            contact_phone: None,
            company_name: Some("Global Tech Corp".to_string()),
            notes: Some("Waiting for response after initial proposal".to_string()),
            lead_score: 70,
            source: Some("website".to_string()),
            ip_address: None,
            user_agent: None,
        },
    ];

    for sample in samples {
        if let Err(e) = LeadService::create_lead(db, sample).await {
            warn!("Failed to seed demo lead: {}", e);
        }
    }

    Ok(())
}
