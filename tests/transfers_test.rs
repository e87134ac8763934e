mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{balance_of, open_account, test_service};
use purse::application::{AppError, ErrorKind};
use purse::domain::Direction;

#[tokio::test]
async fn test_transfer_conserves_money() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "usd", 10_000).await?;
    let y = open_account(&service, "Y", "usd", 2_500).await?;

    let payment = service.transfer_money(&x.id, &y.id, 1_234).await?;

    assert_eq!(balance_of(&service, &x.id).await?, 10_000 - 1_234);
    assert_eq!(balance_of(&service, &y.id).await?, 2_500 + 1_234);

    // The returned record is the outgoing leg
    assert_eq!(payment.direction, Direction::Outgoing);
    assert_eq!(payment.account, x.id);
    assert_eq!(payment.account_to, y.id);
    assert_eq!(payment.amount, 1_234);

    Ok(())
}

#[tokio::test]
async fn test_transfer_records_exactly_two_legs() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "eur", 5_000).await?;
    let y = open_account(&service, "Y", "eur", 100).await?;

    let outgoing = service.transfer_money(&x.id, &y.id, 700).await?;

    let payments = service.list_payments().await?;
    assert_eq!(payments.len(), 2);

    let out: Vec<_> = payments
        .iter()
        .filter(|p| p.direction == Direction::Outgoing)
        .collect();
    let inc: Vec<_> = payments
        .iter()
        .filter(|p| p.direction == Direction::Incoming)
        .collect();
    assert_eq!(out.len(), 1);
    assert_eq!(inc.len(), 1);

    assert_eq!(out[0], &outgoing);
    assert_eq!(inc[0].account, y.id);
    assert_eq!(inc[0].account_to, x.id);
    assert_eq!(inc[0].amount, 700);
    assert_ne!(inc[0].id, out[0].id);

    // Legs net to zero across the ledger
    let net: i64 = payments.iter().map(|p| p.signed_amount()).sum();
    assert_eq!(net, 0);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_funds_changes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "usd", 1_000).await?;
    let y = open_account(&service, "Y", "usd", 1_000).await?;

    let err = service.transfer_money(&x.id, &y.id, 1_001).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientFunds { ref account_id, required: 1_001 } if *account_id == x.id
    ));
    assert_eq!(err.kind(), ErrorKind::Business);

    assert_eq!(balance_of(&service, &x.id).await?, 1_000);
    assert_eq!(balance_of(&service, &y.id).await?, 1_000);
    assert!(service.list_payments().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_transfer_of_entire_balance_leaves_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "usd", 1_000).await?;
    let y = open_account(&service, "Y", "usd", 1).await?;

    service.transfer_money(&x.id, &y.id, 1_000).await?;
    assert_eq!(balance_of(&service, &x.id).await?, 0);

    // An empty account cannot send anything
    let err = service.transfer_money(&x.id, &y.id, 1).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    Ok(())
}

#[tokio::test]
async fn test_currency_mismatch_changes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let dollars = open_account(&service, "Dollars", "usd", 1_000).await?;
    let euros = open_account(&service, "Euros", "eur", 1_000).await?;

    let err = service
        .transfer_money(&dollars.id, &euros.id, 100)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::CurrencyMismatch { ref from_currency, ref to_currency }
            if from_currency == "usd" && to_currency == "eur"
    ));

    assert_eq!(balance_of(&service, &dollars.id).await?, 1_000);
    assert_eq!(balance_of(&service, &euros.id).await?, 1_000);
    assert!(service.list_payments().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_request_validation_order() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "usd", 1_000).await?;

    // Self-transfer wins over a bad amount
    let err = service.transfer_money(&x.id, &x.id, 0).await.unwrap_err();
    assert!(matches!(err, AppError::SelfTransfer));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Bad amount wins over unknown accounts
    for amount in [0, -1, -1_000] {
        let err = service
            .transfer_money("missing-a", "missing-b", amount)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(a) if a == amount));
    }

    let err = service.transfer_money("missing", &x.id, 10).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(ref id) if id == "missing"));

    let err = service.transfer_money(&x.id, "missing", 10).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(ref id) if id == "missing"));

    assert_eq!(balance_of(&service, &x.id).await?, 1_000);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_cannot_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = open_account(&service, "X", "usd", 5_000).await?;
    let y = open_account(&service, "Y", "usd", 1).await?;
    let z = open_account(&service, "Z", "usd", 1).await?;

    let (first, second) = tokio::join!(
        service.transfer_money(&x.id, &y.id, 5_000),
        service.transfer_money(&x.id, &z.id, 5_000),
    );

    let outcomes = [first, second];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientFunds { .. })))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(refused, 1);

    assert_eq!(balance_of(&service, &x.id).await?, 0);
    let y_balance = balance_of(&service, &y.id).await?;
    let z_balance = balance_of(&service, &z.id).await?;
    assert_eq!(y_balance + z_balance, 2 + 5_000);
    assert_eq!(service.list_payments().await?.len(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_parallel_transfers_settle_exactly() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let service = Arc::new(service);
    let source = open_account(&service, "Source", "eur", 500).await?;
    let sink = open_account(&service, "Sink", "eur", 1).await?;

    // Ten transfers of 100 against a balance that covers five
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let service = Arc::clone(&service);
        let (from, to) = (source.id.clone(), sink.id.clone());
        tasks.spawn(async move { service.transfer_money(&from, &to, 100).await });
    }

    let mut succeeded = 0;
    let mut refused = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds { .. }) => refused += 1,
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(refused, 5);
    assert_eq!(balance_of(&service, &source.id).await?, 0);
    assert_eq!(balance_of(&service, &sink.id).await?, 501);
    assert_eq!(service.list_payments().await?.len(), 10);

    Ok(())
}
