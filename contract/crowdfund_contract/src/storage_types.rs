use soroban_sdk::{contracterror, contracttype, Address, String};

// Storage keys for instance data
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    TokenAddress,
    NextCampaignId,
}

// Storage keys for persistent data
#[derive(Clone)]
#[contracttype]
pub enum PersistentKey {
    Campaigns,
    Campaign(CampaignId),
    Approver(CampaignId, Address),
    Request(CampaignId, RequestIndex),
    Approval(CampaignId, RequestIndex, Address),
}

// Campaign ids are assigned from a counter starting at 1; requests are
// indexed 0-based within their campaign.
pub type CampaignId = u64;
pub type RequestIndex = u32;

// Lifecycle of a spending request. Finalization is one-way.
#[derive(Clone, Copy, Debug, PartialEq)]
#[contracttype]
pub enum RequestStatus {
    Pending,
    Finalized,
}

// Per-campaign ledger state
#[derive(Clone)]
#[contracttype]
pub struct Campaign {
    pub id: CampaignId,
    pub manager: Address,
    pub minimum_contribution: i128,
    pub balance: i128,
    pub approvers_count: u32,
    pub request_count: u32,
    pub created_at: u64,
}

// A proposed disbursement of campaign funds
#[derive(Clone)]
#[contracttype]
pub struct Request {
    pub index: RequestIndex,
    pub description: String,
    pub value: i128,
    pub recipient: Address,
    pub status: RequestStatus,
    pub approval_count: u32,
}

// Flattened campaign view returned by `get_summary`
#[derive(Clone)]
#[contracttype]
pub struct CampaignSummary {
    pub minimum_contribution: i128,
    pub balance: i128,
    pub request_count: u32,
    pub approvers_count: u32,
    pub manager: Address,
}

// Contract error codes
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum CrowdfundError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAuthorized = 3,
    InvalidAmount = 4,
    ContributionTooSmall = 5,
    NotApprover = 6,
    AlreadyApproved = 7,
    AlreadyFinalized = 8,
    MajorityNotReached = 9,
    InsufficientBalance = 10,
    CampaignNotFound = 11,
    RequestNotFound = 12,
}

// Constants
pub const TTL_INSTANCE: u32 = 17280 * 30; // 30 days
pub const TTL_PERSISTENT: u32 = 17280 * 90; // 90 days
