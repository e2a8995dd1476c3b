use uuid::Uuid;

use bazaar_customers::error::CustomersServiceError;
use bazaar_customers::usecase::customer::{
    CreateCustomerInput, CreateCustomerUseCase, DeleteCustomerUseCase, GetCustomerUseCase,
    UpdateCustomerInput, UpdateCustomerUseCase,
};

use crate::helpers::{MockCustomerRepo, test_customer};

// ── CreateCustomerUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_customer_with_normalized_fields() {
    let repo = MockCustomerRepo::empty();
    let usecase = CreateCustomerUseCase { repo: repo.clone() };

    let customer = usecase
        .execute(CreateCustomerInput {
            name: "  Grace Hopper ".to_owned(),
            email: "Grace@Navy.MIL".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(customer.name, "Grace Hopper");
    assert_eq!(customer.email, "grace@navy.mil");
    assert_eq!(customer.created_at, customer.updated_at);
    assert_eq!(repo.all(), vec![customer]);
}

#[tokio::test]
async fn should_reject_invalid_name_before_touching_repo() {
    let repo = MockCustomerRepo::empty();
    let usecase = CreateCustomerUseCase { repo: repo.clone() };

    let result = usecase
        .execute(CreateCustomerInput {
            name: "   ".to_owned(),
            email: "grace@navy.mil".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(CustomersServiceError::InvalidName)),
        "expected InvalidName, got {result:?}"
    );
    assert!(repo.all().is_empty());
}

#[tokio::test]
async fn should_reject_invalid_email() {
    let usecase = CreateCustomerUseCase {
        repo: MockCustomerRepo::empty(),
    };

    let result = usecase
        .execute(CreateCustomerInput {
            name: "Grace".to_owned(),
            email: "grace-at-navy".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(CustomersServiceError::InvalidEmail)));
}

#[tokio::test]
async fn should_surface_email_taken_from_repo() {
    let existing = test_customer();
    let usecase = CreateCustomerUseCase {
        repo: MockCustomerRepo::new(vec![existing.clone()]),
    };

    let result = usecase
        .execute(CreateCustomerInput {
            name: "Someone Else".to_owned(),
            email: existing.email.to_uppercase(),
        })
        .await;

    assert!(matches!(result, Err(CustomersServiceError::EmailTaken)));
}

// ── GetCustomerUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_not_found_for_unknown_customer() {
    let usecase = GetCustomerUseCase {
        repo: MockCustomerRepo::empty(),
    };

    let result = usecase.execute(Uuid::now_v7()).await;

    assert!(matches!(result, Err(CustomersServiceError::CustomerNotFound)));
}

// ── UpdateCustomerUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_only_provided_fields() {
    let existing = test_customer();
    let repo = MockCustomerRepo::new(vec![existing.clone()]);
    let usecase = UpdateCustomerUseCase { repo: repo.clone() };

    let updated = usecase
        .execute(
            existing.id,
            UpdateCustomerInput {
                name: Some("Ada King".to_owned()),
                email: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Ada King");
    assert_eq!(updated.email, existing.email);
    assert_eq!(updated.created_at, existing.created_at);
    assert!(updated.updated_at > existing.updated_at);
    assert_eq!(repo.all(), vec![updated]);
}

#[tokio::test]
async fn should_require_at_least_one_field() {
    let existing = test_customer();
    let usecase = UpdateCustomerUseCase {
        repo: MockCustomerRepo::new(vec![existing.clone()]),
    };

    let result = usecase
        .execute(
            existing.id,
            UpdateCustomerInput {
                name: None,
                email: None,
            },
        )
        .await;

    assert!(matches!(result, Err(CustomersServiceError::MissingData)));
}

#[tokio::test]
async fn should_not_update_unknown_customer() {
    let usecase = UpdateCustomerUseCase {
        repo: MockCustomerRepo::empty(),
    };

    let result = usecase
        .execute(
            Uuid::now_v7(),
            UpdateCustomerInput {
                name: None,
                email: Some("new@example.com".to_owned()),
            },
        )
        .await;

    assert!(matches!(result, Err(CustomersServiceError::CustomerNotFound)));
}

// ── DeleteCustomerUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_existing_customer_once() {
    let existing = test_customer();
    let repo = MockCustomerRepo::new(vec![existing.clone()]);
    let usecase = DeleteCustomerUseCase { repo: repo.clone() };

    usecase.execute(existing.id).await.unwrap();
    let second = usecase.execute(existing.id).await;

    assert!(repo.all().is_empty());
    assert!(matches!(second, Err(CustomersServiceError::CustomerNotFound)));
}
