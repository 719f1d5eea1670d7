// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    Cash,
    Bank,
    CreditCard,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::CreditCard => "credit-card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(AccountKind::Cash),
            "bank" => Some(AccountKind::Bank),
            "credit-card" => Some(AccountKind::CreditCard),
            _ => None,
        }
    }

    /// Cash and bank accounts share cash-like balance semantics; credit
    /// cards track `credit_used` instead.
    pub fn is_credit(&self) -> bool {
        matches!(self, AccountKind::CreditCard)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Decimal,
    pub balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub credit_used: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TxKind::Income),
            "expense" => Some(TxKind::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner: String,
    pub account_id: i64,
    pub kind: TxKind,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    /// NULL for user-entered rows; "savings" / "bills" for rows emitted by
    /// the orchestrators. Machine-generated rows may not be edited.
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub owner: String,
    pub category: String,
    pub name: Option<String>,
    pub limit_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spent_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLine {
    pub id: i64,
    pub budget_id: i64,
    pub transaction_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsStatus {
    Active,
    Closed,
}

impl SavingsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsStatus::Active => "active",
            SavingsStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SavingsStatus::Active),
            "closed" => Some(SavingsStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsVehicle {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub vehicle_type: String,
    /// Initial contribution; the running balance starts here.
    pub amount: Decimal,
    pub running_balance: Decimal,
    pub status: SavingsStatus,
    pub closed_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsTxKind {
    Deposit,
    Withdrawal,
    Interest,
    Loss,
    Redemption,
}

impl SavingsTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsTxKind::Deposit => "deposit",
            SavingsTxKind::Withdrawal => "withdrawal",
            SavingsTxKind::Interest => "interest",
            SavingsTxKind::Loss => "loss",
            SavingsTxKind::Redemption => "redemption",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(SavingsTxKind::Deposit),
            "withdrawal" => Some(SavingsTxKind::Withdrawal),
            "interest" => Some(SavingsTxKind::Interest),
            "loss" => Some(SavingsTxKind::Loss),
            "redemption" => Some(SavingsTxKind::Redemption),
            _ => None,
        }
    }

    /// Deposit/withdrawal/redemption move cash through a linked account and
    /// get a companion ledger transaction; interest/loss touch only the
    /// vehicle.
    pub fn moves_cash(&self) -> bool {
        matches!(
            self,
            SavingsTxKind::Deposit | SavingsTxKind::Withdrawal | SavingsTxKind::Redemption
        )
    }

    /// Sign of the effect on the vehicle's running balance.
    pub fn grows_vehicle(&self) -> bool {
        matches!(self, SavingsTxKind::Deposit | SavingsTxKind::Interest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTransaction {
    pub id: i64,
    pub vehicle_id: i64,
    pub kind: SavingsTxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub transaction_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanDirection {
    Taken,
    Given,
}

impl LoanDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanDirection::Taken => "taken",
            LoanDirection::Given => "given",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "taken" => Some(LoanDirection::Taken),
            "given" => Some(LoanDirection::Given),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub owner: String,
    pub direction: LoanDirection,
    pub counterparty: String,
    pub category: String,
    pub amount: Decimal,
    pub interest_rate: Option<Decimal>,
    pub tenure_months: Option<u32>,
    pub remaining_balance: Decimal,
    pub emi_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: i64,
    pub loan_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Paid => "paid",
            BillStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(BillStatus::Unpaid),
            "paid" => Some(BillStatus::Paid),
            "cancelled" => Some(BillStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Custom interval, a whole number of months.
    Months(u32),
}

impl BillFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillFrequency::Daily => "daily",
            BillFrequency::Weekly => "weekly",
            BillFrequency::Monthly => "monthly",
            BillFrequency::Yearly => "yearly",
            BillFrequency::Months(_) => "custom",
        }
    }

    pub fn custom_months(&self) -> Option<u32> {
        match self {
            BillFrequency::Months(n) => Some(*n),
            _ => None,
        }
    }

    pub fn parse(s: &str, custom_months: Option<u32>) -> Option<Self> {
        match s {
            "daily" => Some(BillFrequency::Daily),
            "weekly" => Some(BillFrequency::Weekly),
            "monthly" => Some(BillFrequency::Monthly),
            "yearly" => Some(BillFrequency::Yearly),
            "custom" => custom_months.map(BillFrequency::Months),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub owner: String,
    pub account_id: i64,
    pub name: String,
    pub amount: Decimal,
    /// For a recurring bill this always points at the next unpaid occurrence.
    pub due_date: NaiveDate,
    pub recurring: bool,
    pub frequency: Option<BillFrequency>,
    pub status: BillStatus,
}
