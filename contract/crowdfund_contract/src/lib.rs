#![no_std]

mod events;
mod storage_types;


use storage_types::{
    Campaign, CampaignId, CampaignSummary, CrowdfundError, DataKey, PersistentKey, Request,
    RequestIndex, RequestStatus, TTL_INSTANCE, TTL_PERSISTENT,
};

use soroban_sdk::{contract, contractimpl, panic_with_error, token, Address, Env, String, Vec};

#[contract]
pub struct CrowdfundContract;

#[contractimpl]
impl CrowdfundContract {
    /// Initialize the contract with the funding token address
    pub fn initialize(env: Env, token_address: Address) {
        if env.storage().instance().has(&DataKey::TokenAddress) {
            panic_with_error!(&env, CrowdfundError::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::TokenAddress, &token_address);
        env.storage().instance().set(&DataKey::NextCampaignId, &1u64);
        env.storage()
            .persistent()
            .set(&PersistentKey::Campaigns, &Vec::<CampaignId>::new(&env));

        extend_persistent(&env, &PersistentKey::Campaigns);
        extend_instance(&env);
    }

    /// Create a new campaign managed by `creator`
    pub fn create_campaign(env: Env, creator: Address, minimum_contribution: i128) -> CampaignId {
        creator.require_auth();

        if minimum_contribution <= 0 {
            panic_with_error!(&env, CrowdfundError::InvalidAmount);
        }

        let campaign_id: CampaignId = env
            .storage()
            .instance()
            .get(&DataKey::NextCampaignId)
            .unwrap_or_else(|| panic_with_error!(&env, CrowdfundError::NotInitialized));

        let campaign = Campaign {
            id: campaign_id,
            manager: creator.clone(),
            minimum_contribution,
            balance: 0,
            approvers_count: 0,
            request_count: 0,
            created_at: env.ledger().timestamp(),
        };

        let mut registry: Vec<CampaignId> = env
            .storage()
            .persistent()
            .get(&PersistentKey::Campaigns)
            .unwrap_or_else(|| Vec::new(&env));
        registry.push_back(campaign_id);

        env.storage().persistent().set(&PersistentKey::Campaign(campaign_id), &campaign);
        env.storage().persistent().set(&PersistentKey::Campaigns, &registry);
        env.storage().instance().set(&DataKey::NextCampaignId, &(campaign_id + 1));

        extend_persistent(&env, &PersistentKey::Campaign(campaign_id));
        extend_persistent(&env, &PersistentKey::Campaigns);
        extend_instance(&env);

        events::emit_campaign_created(
            &env,
            events::CampaignCreatedEvent {
                campaign_id,
                manager: creator,
                minimum_contribution,
            },
        );

        campaign_id
    }

    /// All campaign ids, in creation order
    pub fn get_deployed_campaigns(env: Env) -> Vec<CampaignId> {
        env.storage()
            .persistent()
            .get(&PersistentKey::Campaigns)
            .unwrap_or_else(|| Vec::new(&env))
    }

    /// Contribute to a campaign. Contributions strictly above the minimum
    /// grant voting rights; membership is granted once per identity.
    pub fn contribute(env: Env, campaign_id: CampaignId, contributor: Address, amount: i128) {
        contributor.require_auth();

        let mut campaign = get_campaign(&env, campaign_id);
        if amount <= campaign.minimum_contribution {
            panic_with_error!(&env, CrowdfundError::ContributionTooSmall);
        }

        collect_payment(&env, &contributor, amount);
        campaign.balance += amount;

        let approver_key = PersistentKey::Approver(campaign_id, contributor.clone());
        let new_approver = !env.storage().persistent().has(&approver_key);
        if new_approver {
            env.storage().persistent().set(&approver_key, &true);
            campaign.approvers_count += 1;
            extend_persistent(&env, &approver_key);
        }

        env.storage().persistent().set(&PersistentKey::Campaign(campaign_id), &campaign);
        extend_persistent(&env, &PersistentKey::Campaign(campaign_id));

        events::emit_contribution_made(
            &env,
            events::ContributionMadeEvent {
                campaign_id,
                contributor,
                amount,
                new_approver,
            },
        );
    }

    /// Create a spending request (manager only)
    pub fn create_request(
        env: Env,
        campaign_id: CampaignId,
        caller: Address,
        description: String,
        value: i128,
        recipient: Address,
    ) -> RequestIndex {
        caller.require_auth();

        let mut campaign = get_campaign(&env, campaign_id);
        if caller != campaign.manager {
            panic_with_error!(&env, CrowdfundError::NotAuthorized);
        }
        if value <= 0 {
            panic_with_error!(&env, CrowdfundError::InvalidAmount);
        }

        let request_index = campaign.request_count;
        let request = Request {
            index: request_index,
            description: description.clone(),
            value,
            recipient: recipient.clone(),
            status: RequestStatus::Pending,
            approval_count: 0,
        };
        campaign.request_count += 1;

        env.storage()
            .persistent()
            .set(&PersistentKey::Request(campaign_id, request_index), &request);
        env.storage().persistent().set(&PersistentKey::Campaign(campaign_id), &campaign);

        extend_persistent(&env, &PersistentKey::Request(campaign_id, request_index));
        extend_persistent(&env, &PersistentKey::Campaign(campaign_id));

        events::emit_request_created(
            &env,
            events::RequestCreatedEvent {
                campaign_id,
                request_index,
                description,
                value,
                recipient,
            },
        );

        request_index
    }

    /// Vote yes on a request. Approvers only, at most once per request.
    pub fn approve_request(
        env: Env,
        campaign_id: CampaignId,
        approver: Address,
        request_index: RequestIndex,
    ) {
        approver.require_auth();

        get_campaign(&env, campaign_id);

        if !env
            .storage()
            .persistent()
            .has(&PersistentKey::Approver(campaign_id, approver.clone()))
        {
            panic_with_error!(&env, CrowdfundError::NotApprover);
        }

        let mut request = get_request(&env, campaign_id, request_index);

        let vote_key = PersistentKey::Approval(campaign_id, request_index, approver.clone());
        if env.storage().persistent().has(&vote_key) {
            panic_with_error!(&env, CrowdfundError::AlreadyApproved);
        }

        env.storage().persistent().set(&vote_key, &true);
        request.approval_count += 1;
        env.storage()
            .persistent()
            .set(&PersistentKey::Request(campaign_id, request_index), &request);

        extend_persistent(&env, &vote_key);
        extend_persistent(&env, &PersistentKey::Request(campaign_id, request_index));

        events::emit_request_approved(
            &env,
            events::RequestApprovedEvent {
                campaign_id,
                request_index,
                approver,
                approval_count: request.approval_count,
            },
        );
    }

    /// Pay out an approved request (manager only). Transfers the request
    /// value to its recipient and finalizes the request in one invocation.
    pub fn finalize_request(
        env: Env,
        campaign_id: CampaignId,
        caller: Address,
        request_index: RequestIndex,
    ) {
        caller.require_auth();

        let mut campaign = get_campaign(&env, campaign_id);
        if caller != campaign.manager {
            panic_with_error!(&env, CrowdfundError::NotAuthorized);
        }

        let mut request = get_request(&env, campaign_id, request_index);
        match request.status {
            RequestStatus::Pending => {}
            RequestStatus::Finalized => panic_with_error!(&env, CrowdfundError::AlreadyFinalized),
        }

        // Strict majority of all-time approvers, floor division
        if request.approval_count <= campaign.approvers_count / 2 {
            panic_with_error!(&env, CrowdfundError::MajorityNotReached);
        }
        if campaign.balance < request.value {
            panic_with_error!(&env, CrowdfundError::InsufficientBalance);
        }

        disburse_payment(&env, &request.recipient, request.value);
        campaign.balance -= request.value;
        request.status = RequestStatus::Finalized;

        env.storage()
            .persistent()
            .set(&PersistentKey::Request(campaign_id, request_index), &request);
        env.storage().persistent().set(&PersistentKey::Campaign(campaign_id), &campaign);

        extend_persistent(&env, &PersistentKey::Request(campaign_id, request_index));
        extend_persistent(&env, &PersistentKey::Campaign(campaign_id));

        events::emit_request_finalized(
            &env,
            events::RequestFinalizedEvent {
                campaign_id,
                request_index,
                recipient: request.recipient,
                value: request.value,
            },
        );
    }

    /// View functions
    pub fn get_campaign(env: Env, campaign_id: CampaignId) -> Campaign {
        get_campaign(&env, campaign_id)
    }

    pub fn get_request(env: Env, campaign_id: CampaignId, request_index: RequestIndex) -> Request {
        get_request(&env, campaign_id, request_index)
    }

    pub fn get_summary(env: Env, campaign_id: CampaignId) -> CampaignSummary {
        let campaign = get_campaign(&env, campaign_id);
        CampaignSummary {
            minimum_contribution: campaign.minimum_contribution,
            balance: campaign.balance,
            request_count: campaign.request_count,
            approvers_count: campaign.approvers_count,
            manager: campaign.manager,
        }
    }

    pub fn get_requests_count(env: Env, campaign_id: CampaignId) -> u32 {
        get_campaign(&env, campaign_id).request_count
    }

    pub fn is_approver(env: Env, campaign_id: CampaignId, who: Address) -> bool {
        env.storage()
            .persistent()
            .has(&PersistentKey::Approver(campaign_id, who))
    }

    pub fn has_approved(
        env: Env,
        campaign_id: CampaignId,
        request_index: RequestIndex,
        who: Address,
    ) -> bool {
        env.storage()
            .persistent()
            .has(&PersistentKey::Approval(campaign_id, request_index, who))
    }
}

// Helper functions
fn extend_instance(env: &Env) {
    env.storage().instance().extend_ttl(TTL_INSTANCE, TTL_INSTANCE);
}

fn extend_persistent(env: &Env, key: &PersistentKey) {
    env.storage().persistent().extend_ttl(key, TTL_PERSISTENT, TTL_PERSISTENT);
}

fn get_campaign(env: &Env, campaign_id: CampaignId) -> Campaign {
    env.storage()
        .persistent()
        .get(&PersistentKey::Campaign(campaign_id))
        .unwrap_or_else(|| panic_with_error!(env, CrowdfundError::CampaignNotFound))
}

fn get_request(env: &Env, campaign_id: CampaignId, request_index: RequestIndex) -> Request {
    env.storage()
        .persistent()
        .get(&PersistentKey::Request(campaign_id, request_index))
        .unwrap_or_else(|| panic_with_error!(env, CrowdfundError::RequestNotFound))
}

fn funding_token_address(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::TokenAddress)
        .unwrap_or_else(|| panic_with_error!(env, CrowdfundError::NotInitialized))
}

fn collect_payment(env: &Env, from: &Address, amount: i128) {
    let token_client = token::Client::new(env, &funding_token_address(env));
    token_client.transfer(from, &env.current_contract_address(), &amount);
}

fn disburse_payment(env: &Env, to: &Address, amount: i128) {
    let token_client = token::Client::new(env, &funding_token_address(env));
    token_client.transfer(&env.current_contract_address(), to, &amount);
}
