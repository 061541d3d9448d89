//! Inventory Store (§4.2)
//!
//! Durable product list with atomic reservation. All mutations —
//! including `reserve` — are serialized through a single writer and
//! persisted inside the same critical section (§5). Persistence is a
//! single JSON file, written atomically via write-to-temp-then-rename so
//! a crash mid-write can never leave a corrupt or half-written document.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core_types::ProductId;
use crate::error::PipelineError;
use crate::models::{Product, ProductCreate, ProductPatch, ReserveResult};

/// On-disk document shape: just the product list. `next_id` is not
/// persisted — it is recomputed from `max(id) + 1` on load, per §4.2.
#[derive(Debug, Serialize, Deserialize, Default)]
struct InventoryDocument {
    products: Vec<Product>,
}

struct InventoryState {
    products: Vec<Product>,
    next_id: ProductId,
}

/// Demonstration catalog seeded on first start (§4.2).
fn seed_catalog() -> Vec<Product> {
    let now = Utc::now();
    let seed = [
        ("Panel solar portátil", "Energía", "149.99", 10, "Panel solar plegable 60W"),
        ("Botella reutilizable", "Hogar", "12.50", 50, "Acero inoxidable, 750ml"),
        ("Bicicleta urbana", "Movilidad", "389.00", 5, "Aluminio, 21 velocidades"),
        ("Compostador de cocina", "Hogar", "34.90", 20, "Capacidad 5L, con filtro de carbón"),
        ("Cargador solar USB", "Energía", "24.99", 30, "Doble puerto, 10000mAh"),
    ];
    seed.into_iter()
        .enumerate()
        .map(|(i, (name, category, price, stock, description))| Product {
            id: (i + 1) as ProductId,
            name: name.to_string(),
            category: category.to_string(),
            price: price.parse().expect("seed price is a valid decimal literal"),
            available: stock > 0,
            stock,
            description: Some(description.to_string()),
            created_at: now,
        })
        .collect()
}

/// Durable, single-writer product catalog.
pub struct InventoryStore {
    path: PathBuf,
    state: Mutex<InventoryState>,
}

impl InventoryStore {
    /// Load the persisted document at `path`, or seed a fresh one if it
    /// is absent or malformed. Never fails: a corrupt file is logged and
    /// replaced with the seed catalog (§4.2).
    pub fn load_or_seed(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let products = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<InventoryDocument>(&bytes) {
                Ok(doc) => {
                    info!(path = %path.display(), count = doc.products.len(), "inventory loaded");
                    doc.products
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "inventory file malformed, falling back to seed catalog");
                    seed_catalog()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no inventory file found, seeding demonstration catalog");
                seed_catalog()
            }
        };
        let next_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let store = Self {
            path,
            state: Mutex::new(InventoryState { products, next_id }),
        };
        // First run: persist the freshly seeded catalog so a restart sees it.
        let _ = store.persist_locked(&store.state.lock().unwrap());
        store
    }

    /// Atomic write-to-temp-then-rename (§9, grounded in the snapshot
    /// idiom used elsewhere for crash-safe persistence).
    fn persist_locked(&self, state: &InventoryState) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let doc = InventoryDocument {
            products: state.products.clone(),
        };
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<Product> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.state
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn create(&self, data: ProductCreate) -> Result<Product, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let product = Product {
            id,
            name: data.name,
            category: data.category,
            price: data.price,
            available: data.stock > 0,
            stock: data.stock,
            description: data.description,
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        self.persist_locked(&state)?;
        Ok(product)
    }

    pub fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PipelineError::NotFound(crate::error::ProductIdDisplay(id)))?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
            product.recompute_availability();
        }
        if patch.description.is_some() {
            product.description = patch.description;
        }
        let updated = product.clone();
        self.persist_locked(&state)?;
        Ok(updated)
    }

    pub fn delete(&self, id: ProductId) -> Result<(), PipelineError> {
        let mut state = self.state.lock().unwrap();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(PipelineError::NotFound(crate::error::ProductIdDisplay(id)));
        }
        self.persist_locked(&state)
    }

    /// Atomic reservation (§4.2). Serializes with every other mutating
    /// call through the same mutex; persistence happens inside the
    /// critical section, so a concurrent reader can never observe a
    /// decrement that was not also durable (P2, P8).
    pub fn reserve(&self, id: ProductId, qty: u32) -> Result<ReserveResult, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Ok(ReserveResult::NotFound);
        };
        if !product.available {
            return Ok(ReserveResult::NotAvailable);
        }
        if product.stock < qty {
            return Ok(ReserveResult::InsufficientStock {
                available: product.stock,
            });
        }
        product.stock -= qty;
        product.recompute_availability();
        let snapshot = product.clone();
        self.persist_locked(&state)?;
        Ok(ReserveResult::Ok(snapshot))
    }

    /// Inverse of [`Self::reserve`]; used only by the Dispatcher's
    /// rollback path (§4.5).
    pub fn release(&self, id: ProductId, qty: u32) -> Result<(), PipelineError> {
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PipelineError::NotFound(crate::error::ProductIdDisplay(id)))?;
        product.stock += qty;
        product.recompute_availability();
        self.persist_locked(&state)
    }

    /// Aggregate counters for `GET /api/estadisticas` (§6.2).
    pub fn stats(&self) -> (usize, usize, rust_decimal::Decimal) {
        let state = self.state.lock().unwrap();
        let total = state.products.len();
        let available = state.products.iter().filter(|p| p.available).count();
        let value = state
            .products
            .iter()
            .map(|p| p.price * rust_decimal::Decimal::from(p.stock))
            .sum();
        (total, available, value)
    }
}
