//! # Seed Data Generator
//!
//! Populates a development database with an admin account, regular
//! products and a few auction listings.
//!
//! ## Usage
//! ```bash
//! # 200 products (default) into ./data/justcani.db
//! cargo run -p justcani-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p justcani-db --bin seed -- --count 1000 --db ./data/dev.db
//! ```
//!
//! Re-running is safe: existing SKUs and the admin username are skipped.
//!
//! ## Generated Data
//! - Admin `admin` / password `admin123` (change it after first login)
//! - Products across categories, SKU `{CATEGORY}-{NAME}-{INDEX}`
//! - Prices Rp1.000 - Rp50.000 in Rp500 steps, stock 0 - 100
//! - Expiry dates for food categories

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::{Duration, Utc};
use std::env;

use justcani_core::{NewAuctionProduct, NewRegularProduct, NewUser, Role};
use justcani_db::{Database, DbConfig, DbError};

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

/// (category code, perishable, names)
const CATEGORIES: &[(&str, bool, &[&str])] = &[
    (
        "MKN",
        true,
        &[
            "Indomie Goreng",
            "Indomie Soto",
            "Mie Sedaap",
            "Chitato",
            "Qtela Singkong",
            "Roti Tawar",
            "Biskuit Roma",
            "Wafer Tango",
            "Silverqueen",
            "Beng Beng",
        ],
    ),
    (
        "MNM",
        true,
        &[
            "Teh Botol Sosro",
            "Aqua 600ml",
            "Le Minerale",
            "Pocari Sweat",
            "Kopi Kapal Api",
            "Good Day Cappuccino",
            "Susu Ultra",
            "Yakult",
            "Fanta",
            "Coca-Cola",
        ],
    ),
    (
        "SBK",
        true,
        &[
            "Beras Pandan Wangi",
            "Gula Pasir",
            "Minyak Goreng",
            "Telur Ayam",
            "Tepung Terigu",
            "Kecap Bango",
            "Saos ABC",
            "Garam Dapur",
        ],
    ),
    (
        "RTG",
        false,
        &[
            "Sabun Lifebuoy",
            "Shampoo Pantene",
            "Pasta Gigi Pepsodent",
            "Sikat Gigi",
            "Deterjen Rinso",
            "Sunlight",
            "Tisu Paseo",
            "Pewangi Molto",
        ],
    ),
];

const SIZES: &[(&str, i64)] = &[("", 0), ("Besar", 2_500), ("Jumbo", 6_000)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./data/justcani.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("JustCani POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/justcani.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("🌱 JustCani POS Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    // Admin account
    if db.users().get_by_username(ADMIN_USERNAME).await?.is_some() {
        println!("• Admin '{}' already exists", ADMIN_USERNAME);
    } else {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
            .map_err(|e| e.to_string())?
            .to_string();

        db.users()
            .insert(&NewUser {
                username: ADMIN_USERNAME.to_string(),
                email: "admin@justcani.local".to_string(),
                whatsapp: None,
                password_hash,
                role: Role::Admin,
            })
            .await?;
        println!(
            "✓ Created admin '{}' (password '{}')",
            ADMIN_USERNAME, ADMIN_PASSWORD
        );
    }

    // Regular products
    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut skipped = 0;
    let mut seed = 0;

    'outer: for (code, perishable, names) in CATEGORIES {
        for name in names.iter() {
            for (size, addon) in SIZES {
                if generated + skipped >= count {
                    break 'outer;
                }

                let product = generate_product(code, *perishable, name, size, *addon, seed);
                seed += 1;

                match db.products().insert(&product).await {
                    Ok(_) => generated += 1,
                    Err(DbError::UniqueViolation { .. }) => skipped += 1,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", product.sku, e);
                        continue;
                    }
                }

                if generated > 0 && generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    println!(
        "✓ Generated {} products in {:?} ({} already present)",
        generated,
        start.elapsed(),
        skipped
    );

    // Auction listings
    let listings = [
        ("LLG-RICECOOKER", "Rice Cooker Miyako (display)", 150_000, "Unit display"),
        ("LLG-KIPAS", "Kipas Angin Cosmos", 85_000, "Kardus penyok"),
        ("LLG-SETRIKA", "Setrika Philips", 60_000, "Retur pelanggan"),
    ];

    let mut listed = 0;
    for (sku, name, price, reason) in listings {
        let result = db
            .auctions()
            .insert(&NewAuctionProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                price,
                reason: Some(reason.to_string()),
            })
            .await;

        match result {
            Ok(_) => listed += 1,
            Err(DbError::UniqueViolation { .. }) => {}
            Err(e) => eprintln!("Failed to list {}: {}", sku, e),
        }
    }
    println!("✓ Listed {} auction items", listed);

    // Verify search
    println!();
    let hits = db.products().search("indomie", 10).await?;
    println!("  Search 'indomie': {} results", hits.len());

    let counts = db.table_counts().await?;
    println!(
        "  Totals: {} users, {} products, {} auction listings",
        counts.users, counts.regular_products, counts.auction_products
    );

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic pseudo-random values.
fn generate_product(
    category: &str,
    perishable: bool,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewRegularProduct {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:03}", category, short, seed);

    // Rp1.000 - Rp50.000 in Rp500 steps, plus the size surcharge
    let price = 1_000 + ((seed * 37) % 99) as i64 * 500 + price_addon;

    let stock = (seed % 101) as i64;

    let expiry_date =
        perishable.then(|| (Utc::now() + Duration::days(30 + (seed % 300) as i64)).date_naive());

    let full_name = if size.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, size)
    };

    NewRegularProduct {
        sku,
        name: full_name,
        price,
        stock,
        expiry_date,
    }
}
