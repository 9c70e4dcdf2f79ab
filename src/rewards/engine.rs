use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::escrow::{lamports_to_sol, sol_to_lamports};
use crate::goals::models::Goal;
use crate::payouts::models::PayoutType;

/// Computed, pre-execution redistribution outcome for one winner.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutPlan {
    pub goal_id: Uuid,
    pub recipient: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub original_stake: Decimal,

    /// This winner's share of the total winning stake
    #[serde(with = "rust_decimal::serde::float")]
    pub proportion: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub reward_share: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_payout: Decimal,
}

impl PayoutPlan {
    /// Classification is per payout: any redistributed reward makes it a
    /// completion reward, otherwise it is a plain return of stake.
    pub fn payout_type(&self) -> PayoutType {
        if self.reward_share.is_zero() {
            PayoutType::OriginalStake
        } else {
            PayoutType::CompletionReward
        }
    }
}

/// Proportional redistribution: each winner gets their own stake back plus
/// (their stake / total winning stake) of the losing stake pool.
///
/// Pure and deterministic. Callers must pass only settled goals with
/// positive stakes (winners Completed, losers Failed); the trigger's
/// partitioning guarantees this.
///
/// Arithmetic runs in lamports so conservation is exact: every reward is
/// floored to the smallest unit and the rounding remainder goes to the
/// largest-stake winner (ties to the lowest goal id). Plans come back in
/// ascending goal-id order, which is also the order transfers are issued in.
pub fn compute_payout_plans(winners: &[Goal], losers: &[Goal]) -> Vec<PayoutPlan> {
    let total_winners_lamports: u64 = winners
        .iter()
        .map(|g| sol_to_lamports(g.stake_amount))
        .sum();
    let total_losers_lamports: u64 = losers
        .iter()
        .map(|g| sol_to_lamports(g.stake_amount))
        .sum();

    // No one to pay; the losing stakes stay in escrow.
    if winners.is_empty() || total_winners_lamports == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&Goal> = winners.iter().collect();
    ordered.sort_by_key(|g| g.id);

    let mut plans = Vec::with_capacity(ordered.len());
    let mut distributed: u64 = 0;

    for goal in &ordered {
        let stake_lamports = sol_to_lamports(goal.stake_amount);
        let reward_lamports = (stake_lamports as u128 * total_losers_lamports as u128
            / total_winners_lamports as u128) as u64;
        distributed += reward_lamports;

        let reward = lamports_to_sol(reward_lamports);
        plans.push(PayoutPlan {
            goal_id: goal.id,
            recipient: goal.wallet_address.clone(),
            original_stake: goal.stake_amount,
            proportion: Decimal::from(stake_lamports) / Decimal::from(total_winners_lamports),
            reward_share: reward,
            total_payout: goal.stake_amount + reward,
        });
    }

    // Flooring leaves at most (winners - 1) lamports undistributed; assign
    // them to the largest stake so the sum of rewards equals the losing pool
    // exactly.
    let remainder = total_losers_lamports - distributed;
    if remainder > 0 {
        let mut largest = 0;
        for (i, plan) in plans.iter().enumerate() {
            if sol_to_lamports(plan.original_stake) > sol_to_lamports(plans[largest].original_stake)
            {
                largest = i;
            }
        }
        let bump = lamports_to_sol(remainder);
        plans[largest].reward_share += bump;
        plans[largest].total_payout += bump;
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::models::GoalStatus;
    use crate::rewards::testing::goal_with_id;
    use rust_decimal_macros::dec;

    fn uid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn winner(n: u8, stake: Decimal) -> Goal {
        goal_with_id(uid(n), stake, GoalStatus::Completed)
    }

    fn loser(n: u8, stake: Decimal) -> Goal {
        goal_with_id(uid(n), stake, GoalStatus::Failed)
    }

    #[test]
    fn test_single_winner_takes_whole_pool() {
        let winners = vec![winner(1, dec!(0.5))];
        let losers = vec![loser(2, dec!(0.3)), loser(3, dec!(0.7))];

        let plans = compute_payout_plans(&winners, &losers);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].original_stake, dec!(0.5));
        assert_eq!(plans[0].proportion, dec!(1));
        assert_eq!(plans[0].reward_share, dec!(1.0));
        assert_eq!(plans[0].total_payout, dec!(1.5));
    }

    #[test]
    fn test_rewards_split_by_stake() {
        let winners = vec![winner(1, dec!(0.5)), winner(2, dec!(1.5))];
        let losers = vec![loser(3, dec!(1.0))];

        let plans = compute_payout_plans(&winners, &losers);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].proportion, dec!(0.25));
        assert_eq!(plans[0].reward_share, dec!(0.25));
        assert_eq!(plans[0].total_payout, dec!(0.75));
        assert_eq!(plans[1].proportion, dec!(0.75));
        assert_eq!(plans[1].reward_share, dec!(0.75));
        assert_eq!(plans[1].total_payout, dec!(2.25));

        let total_rewards: Decimal = plans.iter().map(|p| p.reward_share).sum();
        assert_eq!(total_rewards, dec!(1.0));
    }

    #[test]
    fn test_conservation_with_rounding_remainder() {
        // 1.0 SOL over stakes 0.1/0.2/0.3 does not divide evenly in lamports
        let winners = vec![
            winner(1, dec!(0.1)),
            winner(2, dec!(0.2)),
            winner(3, dec!(0.3)),
        ];
        let losers = vec![loser(4, dec!(1.0))];

        let plans = compute_payout_plans(&winners, &losers);

        let total_rewards: Decimal = plans.iter().map(|p| p.reward_share).sum();
        assert_eq!(total_rewards, dec!(1.0));

        // remainder lands on the largest stake
        assert_eq!(plans[2].reward_share, dec!(0.500000001));
        assert_eq!(plans[0].reward_share, dec!(0.166666666));
        assert_eq!(plans[1].reward_share, dec!(0.333333333));
    }

    #[test]
    fn test_remainder_tie_goes_to_lowest_id() {
        let winners = vec![
            winner(3, dec!(0.1)),
            winner(1, dec!(0.1)),
            winner(2, dec!(0.1)),
        ];
        let losers = vec![loser(4, dec!(0.1))];

        let plans = compute_payout_plans(&winners, &losers);

        // plans are in ascending id order; equal stakes, so the first plan
        // absorbs the lamport left over by flooring
        assert_eq!(plans[0].goal_id, uid(1));
        assert_eq!(plans[0].reward_share, dec!(0.033333334));
        assert_eq!(plans[1].reward_share, dec!(0.033333333));
        assert_eq!(plans[2].reward_share, dec!(0.033333333));

        let total_rewards: Decimal = plans.iter().map(|p| p.reward_share).sum();
        assert_eq!(total_rewards, dec!(0.1));
    }

    #[test]
    fn test_proportionality() {
        let winners = vec![winner(1, dec!(0.4)), winner(2, dec!(1.6))];
        let losers = vec![loser(3, dec!(2.0))];

        let plans = compute_payout_plans(&winners, &losers);

        // equal return-on-stake for every winner
        let ratio_a = plans[0].reward_share / plans[0].original_stake;
        let ratio_b = plans[1].reward_share / plans[1].original_stake;
        assert_eq!(ratio_a, ratio_b);
    }

    #[test]
    fn test_no_losers_returns_stake_only() {
        let winners = vec![winner(1, dec!(0.5)), winner(2, dec!(2.0))];

        let plans = compute_payout_plans(&winners, &[]);

        assert_eq!(plans.len(), 2);
        for plan in &plans {
            assert_eq!(plan.reward_share, Decimal::ZERO);
            assert_eq!(plan.total_payout, plan.original_stake);
            assert_eq!(plan.payout_type(), PayoutType::OriginalStake);
        }
    }

    #[test]
    fn test_no_winners_returns_empty() {
        let losers = vec![loser(1, dec!(0.5)), loser(2, dec!(1.0))];
        assert!(compute_payout_plans(&[], &losers).is_empty());
    }

    #[test]
    fn test_payout_never_below_stake() {
        let winners = vec![winner(1, dec!(0.25)), winner(2, dec!(0.75))];
        let losers = vec![loser(3, dec!(0.1))];

        for plan in compute_payout_plans(&winners, &losers) {
            assert!(plan.total_payout >= plan.original_stake);
            assert_eq!(plan.payout_type(), PayoutType::CompletionReward);
        }
    }

    #[test]
    fn test_plans_ordered_by_goal_id() {
        let winners = vec![
            winner(9, dec!(0.5)),
            winner(1, dec!(0.5)),
            winner(5, dec!(0.5)),
        ];
        let plans = compute_payout_plans(&winners, &[]);

        assert_eq!(plans[0].goal_id, uid(1));
        assert_eq!(plans[1].goal_id, uid(5));
        assert_eq!(plans[2].goal_id, uid(9));
    }
}
