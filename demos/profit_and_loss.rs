use chrono::NaiveDate;
use financial_report_builder::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::main]
async fn main() {
    println!("📊 Quarterly Profit And Loss Demo\n");

    let accounts = vec![
        AccountMeta::group("income", AccountRootType::Income).with_name("Income"),
        AccountMeta::leaf("sales", AccountRootType::Income)
            .with_parent("income")
            .with_name("Sales"),
        AccountMeta::leaf("consulting", AccountRootType::Income)
            .with_parent("income")
            .with_name("Consulting"),
        AccountMeta::group("expense", AccountRootType::Expense).with_name("Expense"),
        AccountMeta::group("office", AccountRootType::Expense)
            .with_parent("expense")
            .with_name("Office"),
        AccountMeta::leaf("rent", AccountRootType::Expense)
            .with_parent("office")
            .with_name("Rent"),
        AccountMeta::leaf("power", AccountRootType::Expense)
            .with_parent("office")
            .with_name("Power"),
        AccountMeta::leaf("wages", AccountRootType::Expense)
            .with_parent("expense")
            .with_name("Wages"),
    ];

    let postings = vec![
        Posting::credit("sales", date(2024, 1, 15), dec!(12000)),
        Posting::credit("consulting", date(2024, 2, 20), dec!(3500)),
        Posting::debit("rent", date(2024, 1, 1), dec!(2400)),
        Posting::debit("power", date(2024, 3, 5), dec!(310.25)),
        Posting::debit("wages", date(2024, 3, 31), dec!(9000)),
        Posting::credit("sales", date(2024, 5, 2), dec!(8000)),
        Posting::debit("rent", date(2024, 4, 1), dec!(2400)),
        Posting::debit("power", date(2024, 6, 5), dec!(280.75)),
        Posting::debit("wages", date(2024, 6, 30), dec!(9000)),
    ];

    println!("📋 Ledger:");
    println!("  {} accounts, {} postings", accounts.len(), postings.len());
    println!("  Columns: two quarters ending 2024-06-30\n");

    let ledger = InMemoryLedger::new(accounts, postings);
    let filters = ReportFilters::new(Periodicity::Quarterly, date(2024, 6, 30), 2);
    let mut runner = ReportRunner::new(ProfitAndLoss, ledger, filters);

    if let Err(e) = runner.set_report_data(None, true).await {
        eprintln!("❌ Error: {}", e);
        return;
    }

    println!("✅ {}:\n", runner.report().title());
    println!("{}", runner.report_data().to_markdown(&runner.columns()));

    if let Some(profit) = runner.report_data().find_row("Total Profit") {
        println!("📊 Profit by quarter:");
        for (column, cell) in runner.columns().iter().zip(&profit.cells).skip(1) {
            let marker = match cell.color {
                Some(CellColor::Green) => "🟢",
                Some(CellColor::Red) => "🔴",
                None => "⚪",
            };
            println!("  {} {:<22} {:>12}", marker, column.label, cell.display_value);
        }
    }

    println!("\n🔄 Hiding group amounts (no ledger fetch):\n");
    match runner.set_filter(FilterUpdate::HideGroupAmounts(true)).await {
        Ok(()) => println!("{}", runner.report_data().to_markdown(&runner.columns())),
        Err(e) => eprintln!("❌ Error: {}", e),
    }

    match runner.report_data().to_csv(&runner.columns()) {
        Ok(csv) => println!("📄 CSV export:\n{}", csv),
        Err(e) => eprintln!("❌ CSV export failed: {}", e),
    }
}
