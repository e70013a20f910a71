// ============================================================================
// Account Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum AccountCommand {
    OpenAccount {
        owner: String,
    },
    Deposit {
        amount: u64,
    },
    Withdraw {
        amount: u64,
    },
    CloseAccount {
        reason: Option<String>,
    },
}
