// src/commands/demo_data.rs

use super::create_superuser::bootstrap_admin;
use super::CommandOutcome;
use crate::errors::Result as AppResult;
use crate::models::{Category, ProductDraft};
use crate::services::auth_service;
use crate::services::role_policy::CANONICAL_ADMIN_USERNAME;
use crate::state::AppState;
use rust_decimal::Decimal;
use tracing::instrument;

/// Demo products are only added while the catalog has fewer than this many.
pub const DEMO_PRODUCT_THRESHOLD: i64 = 10;

/// `(name, slug)`
pub const DEMO_CATEGORIES: [(&str, &str); 5] = [
  ("Televisores", "televisores"),
  ("Smartphones", "smartphones"),
  ("Laptops", "laptops"),
  ("Audio", "audio"),
  ("Electrodomésticos", "electrodomesticos"),
];

/// `(name, description)`
pub const DEMO_PAYMENT_METHODS: [(&str, &str); 4] = [
  (
    "Tarjeta de Crédito",
    "Pago seguro con tarjeta de crédito Visa, MasterCard, o American Express.",
  ),
  ("PayPal", "Pago rápido y seguro a través de tu cuenta PayPal."),
  ("Transferencia Bancaria", "Transferencia directa a nuestra cuenta bancaria."),
  ("Pago Móvil", "Pago con aplicaciones móviles como Apple Pay o Google Pay."),
];

struct DemoProduct {
  name: &'static str,
  description: &'static str,
  price_cents: i64,
  stock: i32,
  /// Index into `DEMO_CATEGORIES`.
  category: usize,
}

const DEMO_PRODUCTS: [DemoProduct; 10] = [
  DemoProduct {
    name: "Smart TV 4K 55\"",
    description: "TV 4K con resolución 3840x2160, HDR10+, Dolby Vision, sistema operativo Android TV y asistente de voz integrado.",
    price_cents: 69999,
    stock: 15,
    category: 0,
  },
  DemoProduct {
    name: "Smart TV OLED 65\"",
    description: "Experiencia visual inmersiva con negros perfectos, contraste infinito y colores vibrantes. Compatible con todos los formatos HDR.",
    price_cents: 149999,
    stock: 8,
    category: 0,
  },
  DemoProduct {
    name: "Smartphone Galaxy Ultra",
    description: "Pantalla Dynamic AMOLED 2X de 6.8\", cámara principal de 108MP, zoom óptico 10x, 12GB RAM, 256GB almacenamiento.",
    price_cents: 109999,
    stock: 20,
    category: 1,
  },
  DemoProduct {
    name: "iPhone Pro Max",
    description: "Pantalla Super Retina XDR de 6.7\", triple cámara con modo noche, chip A15 Bionic, 5G, 256GB de almacenamiento.",
    price_cents: 129999,
    stock: 12,
    category: 1,
  },
  DemoProduct {
    name: "Laptop UltraBook",
    description: "Procesador Intel Core i7, 16GB RAM, 1TB SSD, pantalla 15.6\" 4K, gráficos NVIDIA GeForce RTX 3060.",
    price_cents: 179999,
    stock: 7,
    category: 2,
  },
  DemoProduct {
    name: "MacBook Pro M2",
    description: "Chip M2 Pro, 16GB RAM, 512GB SSD, pantalla Liquid Retina XDR de 14\", hasta 18 horas de batería.",
    price_cents: 199999,
    stock: 5,
    category: 2,
  },
  DemoProduct {
    name: "Auriculares Inalámbricos Premium",
    description: "Cancelación activa de ruido, hasta 30 horas de batería, conexión Bluetooth 5.2, resistentes al agua IPX4.",
    price_cents: 29999,
    stock: 25,
    category: 3,
  },
  DemoProduct {
    name: "Altavoz Inteligente",
    description: "Sonido 360 grados con graves profundos, control por voz con múltiples asistentes, multiroom y WiFi.",
    price_cents: 19999,
    stock: 18,
    category: 3,
  },
  DemoProduct {
    name: "Refrigerador Smart",
    description: "Nevera inteligente con dispensador de agua, pantalla táctil, cámaras internas, y compartimentos ajustables.",
    price_cents: 249999,
    stock: 3,
    category: 4,
  },
  DemoProduct {
    name: "Robot Aspirador",
    description: "Navegación láser, mapeo inteligente, succión potente de 4000Pa, control por app y compatible con asistentes de voz.",
    price_cents: 49999,
    stock: 10,
    category: 4,
  },
];

/// Seeds the admin account, categories, payment methods and sample products.
/// Safe to re-run: existing records are looked up rather than duplicated.
#[instrument(name = "command::seed_demo_data", skip_all)]
pub async fn seed_demo_data(app_state: &AppState) -> CommandOutcome {
  let mut outcome = CommandOutcome::started();
  let result = run(app_state, &mut outcome).await;
  outcome.finish(result, "Seeding demo data")
}

async fn run(app_state: &AppState, outcome: &mut CommandOutcome) -> AppResult<()> {
  let store = &app_state.store;
  outcome.say("Creating demo data for Todo Electro...");

  if store.find_account_by_username(CANONICAL_ADMIN_USERNAME).await?.is_some() {
    outcome.say(format!("User '{}' already exists.", CANONICAL_ADMIN_USERNAME));
  } else {
    let password_hash = auth_service::hash_password(&app_state.config.bootstrap_admin_password)?;
    store.insert_account(bootstrap_admin(password_hash)).await?;
    outcome.say(format!("User '{}' created.", CANONICAL_ADMIN_USERNAME));
  }

  let mut categories: Vec<Category> = Vec::with_capacity(DEMO_CATEGORIES.len());
  for (name, slug) in DEMO_CATEGORIES {
    let (category, created) = store.get_or_create_category(slug, name).await?;
    if created {
      outcome.say(format!("Category {} created.", category.name));
    } else {
      outcome.say(format!("Category {} already exists.", category.name));
    }
    categories.push(category);
  }

  for (name, description) in DEMO_PAYMENT_METHODS {
    let (method, created) = store.get_or_create_payment_method(name, description).await?;
    if created {
      outcome.say(format!("Payment method {} created.", method.name));
    } else {
      outcome.say(format!("Payment method {} already exists.", method.name));
    }
  }

  if store.count_products().await? < DEMO_PRODUCT_THRESHOLD {
    for demo in &DEMO_PRODUCTS {
      let draft = ProductDraft {
        name: demo.name.to_string(),
        description: demo.description.to_string(),
        price: Decimal::new(demo.price_cents, 2),
        original_price: None,
        has_discount: false,
        discount_percentage: Decimal::ZERO,
        image: None,
        stock: demo.stock,
        category_id: categories[demo.category].id,
      };
      let product = store.create_product(&draft).await?;
      outcome.say(format!("Product {} created.", product.name));
    }
    outcome.say(format!("Created {} demo products.", DEMO_PRODUCTS.len()));
  } else {
    outcome.say("Products already exist in the database.");
  }

  outcome.say(format!(
    "Demo data ready. Sign in as '{}' with the bootstrap password.",
    CANONICAL_ADMIN_USERNAME
  ));
  Ok(())
}
