//! Demo data for local development.
//!
//! Runs only against an empty user collection. Every record goes through the
//! same rule sets as a real request.

use anyhow::Context;
use serde_json::{Value, json};
use tracing::info;

use bizcard_auth::hash_password;
use bizcard_directory::{Card, CardPayload, RegisterUser, User, rules};

use crate::repository::{CardRepository, UserRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { users: usize, cards: usize },
    Skipped { existing_users: u64 },
}

fn users() -> Vec<Value> {
    vec![
        json!({
            "name": { "first": "Avi", "middle": "", "last": "Bitter" },
            "phone": "0521234567",
            "email": "avi@gmail.com",
            "password": "Password123!",
            "image": {
                "url": "https://pics.craiyon.com/2023-11-05/c2d45408dd0848a0a6366c1dd75e9e22.webp",
                "alt": "Avi at the "
            },
            "address": {
                "state": "Merkaz", "country": "Israel", "city": "Tel Aviv",
                "street": "Rotshild Street", "houseNumber": 5, "zip": 12345
            },
            "isBusiness": false,
            "isAdmin": false
        }),
        json!({
            "name": { "first": "Margol", "middle": "Noa", "last": "Fisher" },
            "phone": "0527654321",
            "email": "Margol@business.com",
            "password": "Business123!",
            "image": {
                "url": "https://media.craiyon.com/2025-10-04/GaiyJ_ocSYOuvlMDf6Jr9Q.webp",
                "alt": "Margol at the forest"
            },
            "address": {
                "state": "Ha Tzafon", "country": "Israel", "city": "Haifa",
                "street": "Hertzl Street", "houseNumber": 90, "zip": 10001
            },
            "isBusiness": true,
            "isAdmin": false
        }),
        json!({
            "name": { "first": "Admin", "middle": "", "last": "User" },
            "phone": "0529999999",
            "email": "admin@admin.com",
            "password": "Admin123!",
            "image": {
                "url": "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
                "alt": "Admin user profile picture"
            },
            "address": {
                "state": "Ha Darom", "country": "Israel", "city": "Beer-Sheva",
                "street": "Admin Avenue", "houseNumber": 789, "zip": 73301
            },
            "isBusiness": true,
            "isAdmin": true
        }),
    ]
}

#[derive(Clone, Copy)]
enum Holder {
    Business,
    Admin,
}

fn cards() -> Vec<(Holder, Value)> {
    vec![
        (
            Holder::Business,
            json!({
                "title": "Tech Solutions Pro",
                "subtitle": "Professional IT Services",
                "description": "We provide comprehensive IT solutions for businesses of all sizes. From web development to cloud services.",
                "phone": "0527654321",
                "email": "Margol@business.com",
                "web": "https://margolBusiness.com",
                "image": {
                    "url": "https://media.craiyon.com/2025-09-25/WUnPDqp5TAe0ggEFAj1X2A.webp",
                    "alt": "Tech Solutions Pro office"
                },
                "address": {
                    "state": "Merkaz", "country": "Israel", "city": "Tel Aviv",
                    "street": "Moshe Dayan", "houseNumber": 83, "zip": 10001
                },
                "bizNumber": 1000001
            }),
        ),
        (
            Holder::Admin,
            json!({
                "title": "Creative Design Studio",
                "subtitle": "Graphic Design & Branding",
                "description": "Award-winning design studio specializing in brand identity, web design, and marketing materials.",
                "phone": "0529999999",
                "email": "admin@admin.com",
                "web": "https://creativedesignstudio.com",
                "image": {
                    "url": "https://images.unsplash.com/photo-1558655146-d09347e92766?w=400",
                    "alt": "Creative Design Studio workspace"
                },
                "address": {
                    "state": "Ha Darom", "country": "Israel", "city": "Arad",
                    "street": "Admin street", "houseNumber": 6, "zip": 73301
                },
                "bizNumber": 1000002
            }),
        ),
        (
            Holder::Business,
            json!({
                "title": "Digital Marketing Hub",
                "subtitle": "Online Marketing Solutions",
                "description": "Full-service digital marketing agency helping businesses grow their online presence through SEO, social media, and PPC advertising.",
                "phone": "0521111111",
                "email": "info@digitalmarketinghub.com",
                "web": "https://digitalmarketinghub.com",
                "image": {
                    "url": "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=400",
                    "alt": "Digital Marketing Hub team"
                },
                "address": {
                    "state": "Ha Tzafon", "country": "Israel", "city": "Nesher",
                    "street": "First street", "houseNumber": 8, "zip": 33101
                },
                "bizNumber": 1000003
            }),
        ),
        (
            Holder::Business,
            json!({
                "title": "Green Energy Solutions",
                "subtitle": "Renewable Energy Consulting",
                "description": "Leading renewable energy consultancy helping businesses transition to sustainable energy solutions with solar, wind, and battery storage systems.",
                "phone": "0522222222",
                "email": "contact@greenenergy.com",
                "web": "https://greenenergysolutions.com",
                "image": {
                    "url": "https://images.unsplash.com/photo-1466611653911-95081537e5b7?w=400",
                    "alt": "Solar panels and green energy"
                },
                "address": {
                    "state": "Colorado", "country": "USA", "city": "Denver",
                    "street": "Green Street", "houseNumber": 555, "zip": 80202
                },
                "bizNumber": 1000004
            }),
        ),
        (
            Holder::Admin,
            json!({
                "title": "Gourmet Catering Co.",
                "subtitle": "Premium Event Catering",
                "description": "Luxury catering service for corporate events, weddings, and private parties. Farm-to-table ingredients and exceptional presentation.",
                "phone": "0523333333",
                "email": "events@gourmetcatering.com",
                "web": "https://gourmetcatering.com",
                "image": {
                    "url": "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=400",
                    "alt": "Gourmet catering food presentation"
                },
                "address": {
                    "state": "Nevada", "country": "USA", "city": "Las Vegas",
                    "street": "Culinary Boulevard", "houseNumber": 888, "zip": 89101
                },
                "bizNumber": 1000005
            }),
        ),
    ]
}

/// Create the demo users and cards if no user exists yet.
pub async fn seed_if_empty(
    users_repo: &dyn UserRepository,
    cards_repo: &dyn CardRepository,
) -> anyhow::Result<SeedOutcome> {
    let existing_users = users_repo.count().await?;
    if existing_users > 0 {
        info!(existing_users, "user collection not empty; skipping seed");
        return Ok(SeedOutcome::Skipped { existing_users });
    }

    info!("user collection empty; seeding demo data");

    let mut created = Vec::new();
    for body in users() {
        let input: RegisterUser = rules::REGISTER
            .parse(body)
            .context("seed user does not satisfy the registration rules")?;
        let plain = input.password.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("password hashing task failed")??;
        let user = users_repo.insert(User::register(input, hash)).await?;
        info!(email = %user.profile.email, "created seed user");
        created.push(user);
    }

    let business = created
        .iter()
        .find(|u| u.is_business && !u.is_admin)
        .map(|u| u.id)
        .context("seed data has no business user")?;
    let admin = created
        .iter()
        .find(|u| u.is_admin)
        .map(|u| u.id)
        .context("seed data has no admin user")?;

    let mut card_count = 0;
    for (holder, body) in cards() {
        let payload: CardPayload = rules::CARD
            .parse(body)
            .context("seed card does not satisfy the card rules")?;
        let owner = match holder {
            Holder::Business => business,
            Holder::Admin => admin,
        };
        let card = cards_repo.insert(Card::create(payload, owner)).await?;
        info!(title = %card.details.title, biz_number = card.biz_number, "created seed card");
        card_count += 1;
    }

    info!(users = created.len(), cards = card_count, "seeding complete");
    Ok(SeedOutcome::Seeded {
        users: created.len(),
        cards: card_count,
    })
}
