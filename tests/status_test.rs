//! Status definition model tests - CRUD, uniqueness, soft delete, the single
//! default invariant, sequencing and bulk updates.

mod common;

use estate_workflow::errors::AppError;
use estate_workflow::models::status::{self, BulkField, SequenceOrder, StatusFilter, StatusUpdate};
use estate_workflow::models::workflow::{StatusCollection, StatusType};
use sqlx::PgPool;

use common::*;

const SALES: StatusCollection = StatusCollection::Sales;

#[sqlx::test]
async fn test_create_and_read(pool: PgPool) {
    let created = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;
    assert!(created.id > 0);
    assert_eq!(created.sequence, 2);
    assert_eq!(created.color_code, status::DEFAULT_COLOR);
    assert_eq!(created.created_by, Some(ADMIN_ID));

    let found = status::find_by_id(&pool, SALES, created.id)
        .await
        .expect("query")
        .expect("not found");
    assert_eq!(found.status_code, "BOOK");
    assert_eq!(found.status_type, StatusType::Booked);
    assert_eq!(
        found.allowed_transitions,
        &[StatusType::Allotted, StatusType::Contracted, StatusType::Cancelled, StatusType::OnHold]
    );
}

#[sqlx::test]
async fn test_collections_are_separate(pool: PgPool) {
    let sales = create_sales(&pool, "AVL", "Available", StatusType::Available, 1).await;
    let dev = status::find_by_id(&pool, StatusCollection::Development, sales.id)
        .await
        .expect("query");
    assert!(dev.is_none());

    // Same code in the other collection is fine.
    status::create(
        &pool,
        StatusCollection::Development,
        &new_status("AVL", "Available", StatusType::Available, 1),
        Some(ADMIN_ID),
    )
    .await
    .expect("create in development");
}

#[sqlx::test]
async fn test_create_without_sequence_appends(pool: PgPool) {
    create_sales(&pool, "A", "First", StatusType::Available, 4).await;
    let mut new = new_status("B", "Second", StatusType::Booked, 1);
    new.sequence = None;
    let created = status::create(&pool, SALES, &new, Some(ADMIN_ID)).await.expect("create");
    assert_eq!(created.sequence, 5);
}

#[sqlx::test]
async fn test_append_after_max_sequence_is_rejected(pool: PgPool) {
    create_sales(&pool, "LAST", "Last", StatusType::Closed, i32::MAX).await;
    let mut new = new_status("NEXT", "Next", StatusType::Booked, 1);
    new.sequence = None;

    let result = status::create(&pool, SALES, &new, Some(ADMIN_ID)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    let filter = StatusFilter::default();
    assert_eq!(status::find_paginated(&pool, SALES, &filter).await.unwrap().total, 1);
}

#[sqlx::test]
async fn test_create_without_user_leaves_author_empty(pool: PgPool) {
    let created = status::create(&pool, SALES, &new_status("AVL", "Available", StatusType::Available, 1), None)
        .await
        .expect("create");
    assert_eq!(created.created_by, None);
    assert_eq!(created.updated_by, None);
}

#[sqlx::test]
async fn test_duplicate_code_or_name_conflicts_case_insensitively(pool: PgPool) {
    create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;

    let dup_code = status::create(&pool, SALES, &new_status("book", "Other", StatusType::Booked, 3), Some(ADMIN_ID)).await;
    assert!(matches!(dup_code, Err(AppError::Conflict(ref m)) if m == "Status code already exists"));

    let dup_name = status::create(&pool, SALES, &new_status("BK2", "BOOKED", StatusType::Booked, 3), Some(ADMIN_ID)).await;
    assert!(matches!(dup_name, Err(AppError::Conflict(ref m)) if m == "Status name already exists"));
}

#[sqlx::test]
async fn test_code_reusable_after_soft_delete(pool: PgPool) {
    let first = create_sales(&pool, "HOLD", "On Hold", StatusType::OnHold, 3).await;
    status::soft_delete(&pool, SALES, first.id, ADMIN_ID).await.expect("delete");

    assert!(status::find_by_id(&pool, SALES, first.id).await.expect("query").is_none());
    let (is_deleted, deleted_by): (bool, Option<i64>) = sqlx::query_as(
        "SELECT is_deleted, deleted_by FROM status_definitions WHERE id = $1",
    )
    .bind(first.id)
    .fetch_one(&pool)
    .await
    .expect("row kept");
    assert!(is_deleted);
    assert_eq!(deleted_by, Some(ADMIN_ID));

    let second = create_sales(&pool, "hold", "On Hold", StatusType::OnHold, 3).await;
    assert_ne!(second.id, first.id);
}

#[sqlx::test]
async fn test_update_conflict_excludes_self(pool: PgPool) {
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;
    create_sales(&pool, "RSV", "Reserved", StatusType::Reserved, 3).await;

    // Renaming to its own name (different case) is allowed.
    let update = StatusUpdate { status_name: Some("BOOKED".to_string()), ..Default::default() };
    let updated = status::update(&pool, SALES, booked.id, &update, ADMIN_ID).await.expect("update");
    assert_eq!(updated.status_name, "BOOKED");

    let update = StatusUpdate { status_code: Some("rsv".to_string()), ..Default::default() };
    let result = status::update(&pool, SALES, booked.id, &update, ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[sqlx::test]
async fn test_update_sets_only_supplied_fields(pool: PgPool) {
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;
    let update = StatusUpdate {
        color_code: Some("#112233".to_string()),
        allows_sale: Some(true),
        ..Default::default()
    };
    let updated = status::update(&pool, SALES, booked.id, &update, 42).await.expect("update");
    assert_eq!(updated.color_code, "#112233");
    assert!(updated.allows_sale);
    assert_eq!(updated.status_name, "Booked");
    assert_eq!(updated.sequence, 2);
    assert_eq!(updated.updated_by, Some(42));
}

#[sqlx::test]
async fn test_update_missing_status_is_not_found(pool: PgPool) {
    let result = status::update(&pool, SALES, 999_999, &StatusUpdate::default(), ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[sqlx::test]
async fn test_new_default_replaces_old(pool: PgPool) {
    let first = create_default_sales(&pool, "AVL", "Available").await;
    let mut new = new_status("PND", "Pending", StatusType::Pending, 2);
    new.is_default = true;
    let second = status::create(&pool, SALES, &new, Some(ADMIN_ID)).await.expect("create");

    assert!(second.is_default);
    assert_eq!(count_defaults(&pool, SALES).await, 1);
    let first = status::find_by_id(&pool, SALES, first.id).await.unwrap().unwrap();
    assert!(!first.is_default);

    let found = status::find_default(&pool, SALES).await.unwrap().unwrap();
    assert_eq!(found.id, second.id);
}

#[sqlx::test]
async fn test_update_to_default_clears_others(pool: PgPool) {
    create_default_sales(&pool, "AVL", "Available").await;
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;

    let update = StatusUpdate { is_default: Some(true), is_active: Some(false), ..Default::default() };
    let updated = status::update(&pool, SALES, booked.id, &update, ADMIN_ID).await.expect("update");
    assert!(updated.is_default);
    assert!(updated.is_active, "default status is always active");
    assert_eq!(count_defaults(&pool, SALES).await, 1);
}

#[sqlx::test]
async fn test_concurrent_set_default_leaves_one_default(pool: PgPool) {
    create_default_sales(&pool, "AVL", "Available").await;
    let a = create_sales(&pool, "PND", "Pending", StatusType::Pending, 2).await;
    let b = create_sales(&pool, "HOLD", "On Hold", StatusType::OnHold, 3).await;

    let (ra, rb) = tokio::join!(
        status::set_default(&pool, SALES, a.id, ADMIN_ID),
        status::set_default(&pool, SALES, b.id, ADMIN_ID),
    );
    ra.expect("set a");
    rb.expect("set b");

    assert_eq!(count_defaults(&pool, SALES).await, 1);
    let winner = status::find_default(&pool, SALES).await.unwrap().unwrap();
    assert!(winner.id == a.id || winner.id == b.id);
}

#[sqlx::test]
async fn test_default_cannot_be_deleted_or_deactivated(pool: PgPool) {
    let default = create_default_sales(&pool, "AVL", "Available").await;

    let result = status::soft_delete(&pool, SALES, default.id, ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::BadRequest(ref m)) if m == "Cannot delete default status"));

    let result = status::toggle_active(&pool, SALES, default.id, ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::BadRequest(ref m)) if m == "Cannot deactivate default status"));

    let update = StatusUpdate { is_active: Some(false), ..Default::default() };
    let result = status::update(&pool, SALES, default.id, &update, ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let unchanged = status::find_by_id(&pool, SALES, default.id).await.unwrap().unwrap();
    assert!(unchanged.is_default);
    assert!(unchanged.is_active);
}

#[sqlx::test]
async fn test_toggle_flips_active(pool: PgPool) {
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;
    let off = status::toggle_active(&pool, SALES, booked.id, ADMIN_ID).await.expect("toggle");
    assert!(!off.is_active);
    let on = status::toggle_active(&pool, SALES, booked.id, ADMIN_ID).await.expect("toggle");
    assert!(on.is_active);
}

#[sqlx::test]
async fn test_update_sequence(pool: PgPool) {
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;

    for bad in [0, -1] {
        let result = status::update_sequence(&pool, SALES, booked.id, bad, ADMIN_ID).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    let updated = status::update_sequence(&pool, SALES, booked.id, 1, ADMIN_ID).await.expect("sequence 1");
    assert_eq!(updated.sequence, 1);

    let missing = status::update_sequence(&pool, SALES, 999_999, 3, ADMIN_ID).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[sqlx::test]
async fn test_reorder_accepts_duplicate_sequences(pool: PgPool) {
    let a = create_sales(&pool, "A", "Alpha", StatusType::Available, 1).await;
    let b = create_sales(&pool, "B", "Beta", StatusType::Booked, 2).await;

    // No uniqueness check on sequence: both rows end up at 1.
    let orders = [SequenceOrder { id: a.id, sequence: 1 }, SequenceOrder { id: b.id, sequence: 1 }];
    let updated = status::reorder(&pool, SALES, &orders, ADMIN_ID).await.expect("reorder");
    assert_eq!(updated, vec![a.id, b.id]);

    let b = status::find_by_id(&pool, SALES, b.id).await.unwrap().unwrap();
    assert_eq!(b.sequence, 1);
}

#[sqlx::test]
async fn test_reorder_rejects_non_positive_batch(pool: PgPool) {
    let a = create_sales(&pool, "A", "Alpha", StatusType::Available, 1).await;
    let b = create_sales(&pool, "B", "Beta", StatusType::Booked, 2).await;

    let orders = [SequenceOrder { id: a.id, sequence: 5 }, SequenceOrder { id: b.id, sequence: 0 }];
    let result = status::reorder(&pool, SALES, &orders, ADMIN_ID).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let a = status::find_by_id(&pool, SALES, a.id).await.unwrap().unwrap();
    assert_eq!(a.sequence, 1, "batch is rejected before any write");
}

#[sqlx::test]
async fn test_bulk_deactivate_skips_default(pool: PgPool) {
    let default = create_default_sales(&pool, "AVL", "Available").await;
    let booked = create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;

    let modified = status::bulk_update(
        &pool,
        SALES,
        &[default.id, booked.id],
        BulkField::IsActive,
        false,
        ADMIN_ID,
    )
    .await
    .expect("bulk update");
    assert_eq!(modified, vec![booked.id]);

    let default = status::find_by_id(&pool, SALES, default.id).await.unwrap().unwrap();
    assert!(default.is_active);
    let booked = status::find_by_id(&pool, SALES, booked.id).await.unwrap().unwrap();
    assert!(!booked.is_active);

    let modified = status::bulk_update(
        &pool,
        SALES,
        &[default.id, booked.id],
        BulkField::AllowsSale,
        true,
        ADMIN_ID,
    )
    .await
    .expect("bulk update");
    assert_eq!(modified.len(), 2);
}

#[sqlx::test]
async fn test_list_filters_and_paginates(pool: PgPool) {
    create_default_sales(&pool, "AVL", "Available").await;
    create_sales(&pool, "BOOK", "Booked", StatusType::Booked, 2).await;
    create_sales(&pool, "BOOK2", "Booked (Corporate)", StatusType::Booked, 3).await;
    let hold = create_sales(&pool, "HOLD", "On Hold", StatusType::OnHold, 4).await;
    status::toggle_active(&pool, SALES, hold.id, ADMIN_ID).await.expect("deactivate");

    let all = status::find_paginated(&pool, SALES, &StatusFilter::default()).await.expect("list");
    assert_eq!(all.total, 4);
    let codes: Vec<_> = all.items.iter().map(|s| s.status_code.as_str()).collect();
    assert_eq!(codes, vec!["AVL", "BOOK", "BOOK2", "HOLD"]);

    let filter = StatusFilter { status_type: Some(StatusType::Booked), ..Default::default() };
    assert_eq!(status::find_paginated(&pool, SALES, &filter).await.unwrap().total, 2);

    let filter = StatusFilter { is_active: Some(false), ..Default::default() };
    let inactive = status::find_paginated(&pool, SALES, &filter).await.unwrap();
    assert_eq!(inactive.items.len(), 1);
    assert_eq!(inactive.items[0].id, hold.id);

    let filter = StatusFilter { search: Some("corp".to_string()), ..Default::default() };
    assert_eq!(status::find_paginated(&pool, SALES, &filter).await.unwrap().total, 1);

    let filter = StatusFilter { page: Some(2), limit: Some(3), ..Default::default() };
    let page2 = status::find_paginated(&pool, SALES, &filter).await.unwrap();
    assert_eq!(page2.total, 4);
    assert_eq!(page2.items.len(), 1);
    assert_eq!(page2.items[0].status_code, "HOLD");

    let active = status::find_active(&pool, SALES).await.unwrap();
    assert_eq!(active.len(), 3);
}

#[sqlx::test]
async fn test_page_far_past_the_end_is_empty(pool: PgPool) {
    create_default_sales(&pool, "AVL", "Available").await;

    let filter = StatusFilter { page: Some(i64::MAX), limit: Some(100), ..Default::default() };
    let page = status::find_paginated(&pool, SALES, &filter).await.expect("list");
    assert_eq!(page.total, 1);
    assert!(page.items.is_empty());
}

#[sqlx::test]
async fn test_reorder_reports_only_updated_ids(pool: PgPool) {
    let a = create_sales(&pool, "A", "Alpha", StatusType::Available, 1).await;
    let gone = create_sales(&pool, "G", "Gone", StatusType::Booked, 2).await;
    status::soft_delete(&pool, SALES, gone.id, ADMIN_ID).await.expect("delete");

    let orders = [
        SequenceOrder { id: a.id, sequence: 3 },
        SequenceOrder { id: gone.id, sequence: 4 },
        SequenceOrder { id: 777_777, sequence: 5 },
    ];
    let updated = status::reorder(&pool, SALES, &orders, ADMIN_ID).await.expect("reorder");
    assert_eq!(updated, vec![a.id]);
}
