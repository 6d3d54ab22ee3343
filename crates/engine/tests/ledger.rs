mod common;

use engine::{Amount, Category, EngineError, ExpenseInput};

use common::{memory_engine, month};

fn lunch<'a>(amount: &'a str) -> ExpenseInput<'a> {
    ExpenseInput {
        date: "2025-03-04",
        category: "food",
        description: "Lunch",
        amount,
        payment_type: "card",
    }
}

#[tokio::test]
async fn income_crud() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    let id = engine.add_income(march, " Salary ", "3000").await.unwrap();
    let income = engine.income(id).await.unwrap();
    assert_eq!(income.description, "Salary");
    assert_eq!(income.amount, Amount::from_minor(300_000));
    assert_eq!(income.month, march);

    engine.edit_income(id, "Salary", "3100.50").await.unwrap();
    let edited = engine.income(id).await.unwrap();
    assert_eq!(edited.id, id);
    assert_eq!(edited.amount, Amount::from_minor(310_050));

    engine.delete_income(id).await.unwrap();
    assert_eq!(
        engine.income(id).await,
        Err(EngineError::RecordNotFound(format!("income {id}")))
    );
    assert!(engine.list_income(march).await.unwrap().is_empty());
}

#[tokio::test]
async fn expense_crud_keeps_id_and_month() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    let id = engine.add_expense(march, lunch("12,50")).await.unwrap();
    let expense = engine.expense(id).await.unwrap();
    assert_eq!(expense.category, Category::Food);
    assert_eq!(expense.amount, Amount::from_minor(1_250));
    assert_eq!(expense.payment_type, "card");

    engine
        .edit_expense(
            id,
            ExpenseInput {
                date: "2025-03-05",
                category: "Travel",
                description: "Taxi",
                amount: "20",
                payment_type: "",
            },
        )
        .await
        .unwrap();
    let edited = engine.expense(id).await.unwrap();
    assert_eq!(edited.id, id);
    assert_eq!(edited.month, march);
    assert_eq!(edited.category, Category::Uncategorized("Travel".to_string()));
    assert_eq!(edited.description, "Taxi");

    engine.delete_expense(id).await.unwrap();
    assert!(engine.list_expenses(march).await.unwrap().is_empty());
}

#[tokio::test]
async fn expenses_are_listed_newest_first() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    let first = engine.add_expense(march, lunch("1")).await.unwrap();
    let later = engine
        .add_expense(
            march,
            ExpenseInput {
                date: "2025-03-20",
                ..lunch("2")
            },
        )
        .await
        .unwrap();
    let same_day = engine.add_expense(march, lunch("3")).await.unwrap();

    let ids: Vec<i64> = engine
        .list_expenses(march)
        .await
        .unwrap()
        .iter()
        .map(|expense| expense.id)
        .collect();
    assert_eq!(ids, [later, same_day, first]);
}

#[tokio::test]
async fn emi_crud() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    let id = engine.add_emi(march, "Car", "1000").await.unwrap();
    engine.edit_emi(id, "Car loan", "950").await.unwrap();
    let emi = engine.emi(id).await.unwrap();
    assert_eq!(emi.loan_name, "Car loan");
    assert_eq!(emi.amount, Amount::from_minor(95_000));

    engine.delete_emi(id).await.unwrap();
    assert!(engine.list_emis(march).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_amount_writes_nothing() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    for bad in ["abc", "", "-5", "1.234"] {
        assert!(matches!(
            engine.add_income(march, "Salary", bad).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.add_expense(march, lunch(bad)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.add_emi(march, "Car", bad).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.set_budget(march, "Food", bad).await,
            Err(EngineError::InvalidAmount(_))
        ));
    }

    assert!(engine.is_month_empty(march).await.unwrap());
}

#[tokio::test]
async fn invalid_text_is_rejected() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    assert!(matches!(
        engine.add_emi(march, "   ", "10").await,
        Err(EngineError::InvalidName(_))
    ));
    assert!(matches!(
        engine
            .add_expense(
                march,
                ExpenseInput {
                    date: "04/03/2025",
                    ..lunch("10")
                }
            )
            .await,
        Err(EngineError::InvalidDate(_))
    ));
    assert!(engine.is_month_empty(march).await.unwrap());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let engine = memory_engine().await;

    assert_eq!(
        engine.edit_income(42, "Salary", "10").await,
        Err(EngineError::RecordNotFound("income 42".to_string()))
    );
    assert_eq!(
        engine.delete_expense(42).await,
        Err(EngineError::RecordNotFound("expense 42".to_string()))
    );
    assert_eq!(
        engine.delete_emi(42).await,
        Err(EngineError::RecordNotFound("emi 42".to_string()))
    );
    assert_eq!(
        engine.edit_budget(42, "10").await,
        Err(EngineError::RecordNotFound("budget 42".to_string()))
    );
    assert!(matches!(
        engine.budget(42).await,
        Err(EngineError::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn budget_upsert_keeps_one_row() {
    let engine = memory_engine().await;
    let march = month("2025-03");

    let id = engine.set_budget(march, "Food", "500").await.unwrap();
    let again = engine.set_budget(march, "food", "700").await.unwrap();
    assert_eq!(id, again);

    let budgets = engine.list_budgets(march).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category, Category::Food);
    assert_eq!(budgets[0].amount, Amount::from_minor(70_000));

    // same category in another month is a different budget
    let april = engine.set_budget(month("2025-04"), "Food", "500").await.unwrap();
    assert_ne!(april, id);
}

#[tokio::test]
async fn available_months_include_the_active_one() {
    let engine = memory_engine().await;

    engine.add_income(month("2025-01"), "Salary", "1").await.unwrap();
    engine.set_budget(month("2025-03"), "Food", "1").await.unwrap();
    engine.add_emi(month("2025-03"), "Car", "1").await.unwrap();

    let months = engine.available_months(month("2025-05")).await.unwrap();
    assert_eq!(
        months,
        [month("2025-05"), month("2025-03"), month("2025-01")]
    );
}
