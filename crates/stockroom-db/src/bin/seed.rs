//! # Demo Inventory Loader
//!
//! Bulk-loads demo inventory for one account so the pages and dashboard have
//! something to show.
//!
//! ## Usage
//! ```bash
//! # 200 items for the "demo" account (created when missing)
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom amount, owner and database
//! cargo run -p stockroom-db --bin seed -- --count 1000 --user alice --db ./data/stockroom.db
//! ```
//!
//! ## Generated Items
//! - Names: `{product} {variant}`, e.g. "Claw Hammer Large"
//! - Category: one of the groups below (created on demand)
//! - Supplier: rotated through a fixed list, so the supplier overview fills up
//! - Price: 1.99 - 649.99
//! - Quantity: 0 - 60 (roughly a fifth of the items land in low stock)

use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use std::env;
use std::time::Instant;
use stockroom_core::{CategoryRef, ItemFilter, Money, NewItem, NewUser, Role, User};
use stockroom_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Product groups for demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Hand Tools",
        &[
            "Claw Hammer",
            "Screwdriver Set",
            "Adjustable Wrench",
            "Tape Measure",
            "Utility Knife",
            "Pliers",
        ],
    ),
    (
        "Power Tools",
        &["Cordless Drill", "Circular Saw", "Angle Grinder", "Jigsaw", "Orbital Sander"],
    ),
    (
        "Paint",
        &["Interior Latex", "Exterior Enamel", "Primer", "Wood Stain", "Spray Paint"],
    ),
    (
        "Fasteners",
        &["Wood Screws", "Drywall Anchors", "Hex Bolts", "Finishing Nails", "Washers"],
    ),
    (
        "Garden",
        &["Garden Hose", "Pruning Shears", "Leaf Rake", "Wheelbarrow", "Potting Soil"],
    ),
];

const VARIANTS: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 500),
    ("Large", 1_500),
    ("Pro", 7_500),
    ("Contractor Pack", 50_000),
];

const SUPPLIERS: &[&str] = &[
    "Acme Hardware",
    "Northwind Supply",
    "Globex Industrial",
    "Initech Tools",
    "Umbrella Garden Co",
    "Stark Fasteners",
];

struct Args {
    count: usize,
    db_path: String,
    username: String,
    password: String,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        count: 200,
        db_path: String::from("./stockroom.db"),
        username: String::from("demo"),
        password: String::from("demo-password"),
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--count" | "-c" => {
                parsed.count = value.and_then(|v| v.parse().ok()).unwrap_or(parsed.count);
                i += 1;
            }
            "--db" | "-d" => {
                parsed.db_path = value.unwrap_or(parsed.db_path);
                i += 1;
            }
            "--user" | "-u" => {
                parsed.username = value.unwrap_or(parsed.username);
                i += 1;
            }
            "--password" | "-p" => {
                parsed.password = value.unwrap_or(parsed.password);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Stockroom demo inventory loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>         Items to generate (default: 200)");
                println!("  -d, --db <PATH>         Database file path (default: ./stockroom.db)");
                println!("  -u, --user <NAME>       Owning account (default: demo)");
                println!(
                    "  -p, --password <PASS>   Password if the account is created \
                     (default: demo-password)"
                );
                println!("  -h, --help              Show this help message");
                return None;
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }
    Some(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    info!(db = %args.db_path, count = args.count, user = %args.username, "Seeding demo inventory");

    let db = Database::new(DbConfig::new(&args.db_path).max_connections(1))
        .await
        .context("failed to open database")?;

    let owner = ensure_owner(&db, &args).await?;

    let existing = db.items().count(Some(owner.user_id)).await?;
    if existing > 0 {
        warn!(
            existing,
            user = %owner.username,
            "Account already has items; skipping seed to avoid duplicates"
        );
        return Ok(());
    }

    let start = Instant::now();
    let mut generated = 0usize;
    let mut failed = 0usize;

    'outer: for round in 0.. {
        for (category_idx, (category, products)) in CATEGORIES.iter().enumerate() {
            for (product_idx, product) in products.iter().enumerate() {
                for (variant_idx, variant) in VARIANTS.iter().enumerate() {
                    if generated >= args.count {
                        break 'outer;
                    }
                    let seed = round * 1_000 + category_idx * 100 + product_idx * 10 + variant_idx;
                    let item = generate_item(category, product, *variant, seed, owner.user_id);

                    match db.items().create(&item).await {
                        Ok(_) => generated += 1,
                        Err(e) => {
                            failed += 1;
                            warn!(name = %item.name, error = %e, "Failed to insert item");
                            if failed > args.count {
                                anyhow::bail!("too many insert failures, last: {e}");
                            }
                        }
                    }

                    if generated > 0 && generated % 100 == 0 {
                        info!(generated, "Progress");
                    }
                }
            }
        }
    }

    let elapsed = start.elapsed();
    info!(
        generated,
        failed,
        elapsed_ms = elapsed.as_millis() as u64,
        "Seed complete"
    );

    let sample = db
        .items()
        .list(&ItemFilter {
            search: Some("hammer".to_string()),
            owner_id: Some(owner.user_id),
            ..Default::default()
        })
        .await?;
    info!(matches = sample.len(), "Search 'hammer'");

    db.close().await;
    Ok(())
}

/// Returns the owning account, creating it with the given password if absent.
async fn ensure_owner(db: &Database, args: &Args) -> anyhow::Result<User> {
    if let Some(user) = db.users().get_by_username(&args.username).await? {
        return Ok(user);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(args.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();

    let user = db
        .users()
        .create(&NewUser {
            username: args.username.clone(),
            password_hash: hash,
            role: Role::Regular,
        })
        .await?;
    info!(user = %user.username, "Created demo account");
    Ok(user)
}

fn generate_item(
    category: &str,
    product: &str,
    (variant, price_addon): (&str, i64),
    seed: usize,
    owner: i64,
) -> NewItem {
    // 1.99 - 9.98 base, plus the variant surcharge
    let base_cents = 199 + ((seed * 37) % 800) as i64;
    let quantity = ((seed * 13) % 61) as i64;
    let round = seed / 1_000;

    let name = if round == 0 {
        format!("{product} {variant}")
    } else {
        format!("{product} {variant} #{}", round + 1)
    };

    NewItem {
        name,
        description: Some(format!("{variant} {product} ({category})")),
        quantity,
        price: Money::from_cents(base_cents + price_addon),
        category: CategoryRef::Name(category.to_string()),
        supplier: Some(SUPPLIERS[seed % SUPPLIERS.len()].to_string()),
        created_by: owner,
    }
}
