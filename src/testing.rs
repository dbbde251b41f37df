//! Shared fixtures for unit tests: a seeded directory and one session per role.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{Role, Session, SessionStore};
use crate::directory::{Branch, Customer, Forwarder, InMemoryDirectory, Truck, User};
use crate::domain::consignment::{
    Cargo, ConsignmentNote, ConsignmentNumber, ConsignmentStatus, CreateConsignmentRequest, Forwarding,
    PaymentMethod, Pricing,
};
use crate::domain::pickup::CreatePickupRequest;
use crate::metrics::Metrics;

pub struct Fixture {
    pub directory: Arc<InMemoryDirectory>,
    pub metrics: Arc<Metrics>,

    pub jakarta: Branch,
    pub surabaya: Branch,
    pub medan: Branch,

    pub sender: Customer,
    pub recipient: Customer,
    /// Never used on a consignment
    pub walk_in: Customer,
    pub forwarder: Forwarder,
    pub truck: Truck,
    pub spare_truck: Truck,

    pub director: Session,
    pub head_jkt: Session,
    pub admin_jkt: Session,
    pub admin_sby: Session,
    pub admin_mdn: Session,
    pub checker_jkt: Session,
    pub courier_jkt: Session,
    pub finance_jkt: Session,
}

fn branch(code: &str, name: &str) -> Branch {
    Branch {
        id: Uuid::new_v4(),
        code: code.to_string(),
        name: name.to_string(),
    }
}

fn customer(name: &str, branch: &Branch) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: Some("0812000000".to_string()),
        address: None,
        branch_id: branch.id,
    }
}

impl Fixture {
    pub async fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let metrics = Arc::new(Metrics::new().unwrap());

        let jakarta = branch("JKT", "Jakarta");
        let surabaya = branch("SBY", "Surabaya");
        let medan = branch("MDN", "Medan");
        for b in [&jakarta, &surabaya, &medan] {
            directory.add_branch(b.clone()).await;
        }

        let sender = customer("PT Sinar Jaya", &jakarta);
        let recipient = customer("CV Maju Bersama", &surabaya);
        let walk_in = customer("Toko Sederhana", &jakarta);
        for c in [&sender, &recipient, &walk_in] {
            directory.add_customer(c.clone()).await;
        }

        let forwarder = Forwarder {
            id: Uuid::new_v4(),
            code: "JNE".to_string(),
            name: "Jalur Nugraha Ekakurir".to_string(),
        };
        directory.add_forwarder(forwarder.clone()).await;

        let truck = Truck { id: Uuid::new_v4(), plate_number: "B 9123 KX".to_string(), branch_id: jakarta.id };
        let spare_truck = Truck { id: Uuid::new_v4(), plate_number: "B 9456 KX".to_string(), branch_id: jakarta.id };
        directory.add_truck(truck.clone()).await;
        directory.add_truck(spare_truck.clone()).await;

        let mut sessions = Vec::new();
        for (name, role, home) in [
            ("Direktur", Role::Director, &jakarta),
            ("Kepala Jakarta", Role::BranchHead, &jakarta),
            ("Admin Jakarta", Role::Admin, &jakarta),
            ("Admin Surabaya", Role::Admin, &surabaya),
            ("Admin Medan", Role::Admin, &medan),
            ("Checker Jakarta", Role::Checker, &jakarta),
            ("Kurir Jakarta", Role::Courier, &jakarta),
            ("Keuangan Jakarta", Role::Finance, &jakarta),
        ] {
            let user = User { id: Uuid::new_v4(), name: name.to_string(), role, branch_id: home.id };
            directory.add_user(user.clone()).await;
            sessions.push(Session::new(user.id, user.name, role, home.id));
        }

        let mut sessions = sessions.into_iter();
        let mut next = move || sessions.next().unwrap();

        Self {
            director: next(),
            head_jkt: next(),
            admin_jkt: next(),
            admin_sby: next(),
            admin_mdn: next(),
            checker_jkt: next(),
            courier_jkt: next(),
            finance_jkt: next(),
            directory,
            metrics,
            jakarta,
            surabaya,
            medan,
            sender,
            recipient,
            walk_in,
            forwarder,
            truck,
            spare_truck,
        }
    }

    /// Jakarta -> Surabaya, 2.5 kg at 15000 per kg, price left to derive
    pub fn create_request(&self) -> CreateConsignmentRequest {
        CreateConsignmentRequest {
            origin_branch_id: Some(self.jakarta.id),
            destination_branch_id: Some(self.surabaya.id),
            sender_id: Some(self.sender.id),
            recipient_id: Some(self.recipient.id),
            item_name: "Sparepart motor".to_string(),
            commodity: "GENERAL".to_string(),
            packing: "KARDUS".to_string(),
            pieces: Some(2),
            weight_kg: Some(Decimal::new(25, 1)),
            rate_per_kg: Some(Decimal::new(15000, 0)),
            payment_method: Some(PaymentMethod::CashOnDelivery),
            ..Default::default()
        }
    }

    pub fn pickup_request(&self) -> CreatePickupRequest {
        CreatePickupRequest {
            sender_id: Some(self.sender.id),
            pickup_address: "Jl. Gatot Subroto 12, Jakarta".to_string(),
            destination: "Surabaya".to_string(),
            pieces: Some(3),
            requested_at: None,
        }
    }

    /// Bearer tokens named after the session fields, e.g. "admin_jkt"
    pub async fn seed_sessions(&self, store: &SessionStore) {
        for (token, session) in [
            ("director", &self.director),
            ("head_jkt", &self.head_jkt),
            ("admin_jkt", &self.admin_jkt),
            ("admin_sby", &self.admin_sby),
            ("admin_mdn", &self.admin_mdn),
            ("checker_jkt", &self.checker_jkt),
            ("courier_jkt", &self.courier_jkt),
            ("finance_jkt", &self.finance_jkt),
        ] {
            store.insert(token, session.clone()).await;
        }
    }
}

static SEQUENCE: AtomicU32 = AtomicU32::new(1);

/// Standalone snapshot for read model tests; every call gets fresh ids
pub fn sample_note() -> ConsignmentNote {
    let now = Utc::now();
    let number = ConsignmentNumber::compose("JKT260101", SEQUENCE.fetch_add(1, Ordering::Relaxed));

    ConsignmentNote {
        id: Uuid::new_v4(),
        version: 1,
        barcode: number.barcode(),
        number,
        origin_branch_id: Uuid::new_v4(),
        destination_branch_id: Uuid::new_v4(),
        sender_id: Uuid::new_v4(),
        recipient_id: Uuid::new_v4(),
        cargo: Cargo {
            item_name: "Sparepart motor".to_string(),
            commodity: "GENERAL".to_string(),
            packing: "KARDUS".to_string(),
            pieces: 1,
            weight_kg: Decimal::ONE,
        },
        pricing: Pricing::derive(Decimal::new(15000, 0), Decimal::ONE).unwrap(),
        payment_method: PaymentMethod::CashOnCreation,
        forwarding: Forwarding::direct(),
        created_by: Uuid::new_v4(),
        owning_branch_id: Uuid::new_v4(),
        status: ConsignmentStatus::Pending,
        truck_id: None,
        assigned_at: None,
        created_at: now,
        updated_at: now,
    }
}
