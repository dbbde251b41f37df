use uuid::Uuid;

use crate::auth::{Role, Session, SessionStore};
use crate::directory::{Branch, Customer, Forwarder, InMemoryDirectory, Truck, User};

// ============================================================================
// Demo Seed - reference data and bearer tokens for a local run
// ============================================================================

const BRANCHES: &[(&str, &str)] = &[("JKT", "Jakarta"), ("SBY", "Surabaya"), ("MDN", "Medan")];

const USERS: &[(&str, &str, Role, usize)] = &[
    ("demo-director", "Direktur Utama", Role::Director, 0),
    ("demo-ops", "Manajer Operasional", Role::OperationsManager, 0),
    ("demo-head-sby", "Kepala Cabang Surabaya", Role::BranchHead, 1),
    ("demo-admin-jkt", "Admin Jakarta", Role::Admin, 0),
    ("demo-checker-jkt", "Checker Jakarta", Role::Checker, 0),
    ("demo-courier-jkt", "Kurir Jakarta", Role::Courier, 0),
    ("demo-finance-jkt", "Keuangan Jakarta", Role::Finance, 0),
];

/// Fill the directory and register one session per demo user.
/// Returns the bearer tokens that were issued.
pub async fn seed_demo(directory: &InMemoryDirectory, sessions: &SessionStore) -> Vec<&'static str> {
    let mut branches = Vec::with_capacity(BRANCHES.len());
    for (code, name) in BRANCHES {
        let branch = Branch {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
        };
        directory.add_branch(branch.clone()).await;
        branches.push(branch);
    }

    for (i, name) in ["PT Sinar Jaya", "CV Maju Bersama", "Toko Sederhana"].into_iter().enumerate() {
        directory
            .add_customer(Customer {
                id: Uuid::new_v4(),
                name: name.to_string(),
                phone: None,
                address: None,
                branch_id: branches[i % branches.len()].id,
            })
            .await;
    }

    directory
        .add_forwarder(Forwarder {
            id: Uuid::new_v4(),
            code: "JNE".to_string(),
            name: "Jalur Nugraha Ekakurir".to_string(),
        })
        .await;

    for (plate, branch) in [("B 9123 KX", &branches[0]), ("L 8812 UA", &branches[1])] {
        directory
            .add_truck(Truck {
                id: Uuid::new_v4(),
                plate_number: plate.to_string(),
                branch_id: branch.id,
            })
            .await;
    }

    let mut tokens = Vec::with_capacity(USERS.len());
    for (token, name, role, branch) in USERS {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role: *role,
            branch_id: branches[*branch].id,
        };
        directory.add_user(user.clone()).await;
        sessions
            .insert(*token, Session::new(user.id, user.name, user.role, user.branch_id))
            .await;
        tokens.push(*token);
    }

    tracing::info!(
        branches = branches.len(),
        users = tokens.len(),
        "Seeded demo directory"
    );
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_tokens_resolve() {
        let directory = InMemoryDirectory::new();
        let sessions = SessionStore::new();

        let tokens = seed_demo(&directory, &sessions).await;
        assert_eq!(tokens.len(), USERS.len());

        let director = sessions.resolve(Some("demo-director")).await.unwrap();
        assert_eq!(director.role, Role::Director);
        assert!(crate::directory::Directory::branch(&directory, director.branch_id)
            .await
            .unwrap()
            .is_some());
    }
}
