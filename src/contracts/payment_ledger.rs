//! Payment ledger facade: disbursements and EMI installments.

use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{LedgerResult, ReadOutcome, WriteReceipt};
use crate::contracts::abi::IPaymentLedger;
use crate::contracts::binding::{convert_all, decode_error, Binding};
use crate::contracts::records::{Disbursement, DisbursementRecord, EmiPayment, PaymentRecord};
use crate::contracts::units::{to_base_units, to_chain_time};
use crate::hashing::HashedIdentifier;

#[derive(Debug, Clone)]
pub struct PaymentLedger {
    binding: Binding,
}

impl PaymentLedger {
    pub fn new(ctx: Option<Arc<LedgerContext>>) -> Self {
        Self {
            binding: Binding::new("payment ledger", ctx, |c| c.payment_ledger),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    pub async fn submit_disbursement(&self, disbursement: &Disbursement) -> WriteReceipt {
        tracing::info!(
            application_hash = %HashedIdentifier::of(&disbursement.application_id),
            "Recording disbursement"
        );

        self.binding
            .write("record_disbursement", |g| g.disbursement, || {
                Ok(IPaymentLedger::recordDisbursementCall {
                    applicationHash: HashedIdentifier::of(&disbursement.application_id).as_b256(),
                    phoneHash: HashedIdentifier::of(&disbursement.phone).as_b256(),
                    amount: to_base_units(disbursement.amount)?,
                    referenceHash: HashedIdentifier::of(&disbursement.reference).as_b256(),
                }
                .abi_encode())
            })
            .await
    }

    pub async fn submit_emi_payment(&self, payment: &EmiPayment) -> WriteReceipt {
        self.binding
            .write("record_emi_payment", |g| g.emi_payment, || {
                Ok(IPaymentLedger::recordEmiPaymentCall {
                    applicationHash: HashedIdentifier::of(&payment.application_id).as_b256(),
                    phoneHash: HashedIdentifier::of(&payment.phone).as_b256(),
                    installment: payment.installment,
                    amount: to_base_units(payment.amount)?,
                    dueDate: to_chain_time(payment.due_date)?,
                    status: payment.status.code()?,
                }
                .abi_encode())
            })
            .await
    }

    pub async fn query_disbursements(&self, phone: &str) -> ReadOutcome<DisbursementRecord> {
        self.query_disbursements_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_disbursements_by_hash(
        &self,
        phone_hash: HashedIdentifier,
    ) -> ReadOutcome<DisbursementRecord> {
        let data = IPaymentLedger::getDisbursementsCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_disbursements", data, |bytes| -> LedgerResult<Vec<DisbursementRecord>> {
                let entries = IPaymentLedger::getDisbursementsCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_disbursements", e))?;
                convert_all(entries)
            })
            .await
    }

    pub async fn query_emis(&self, phone: &str) -> ReadOutcome<PaymentRecord> {
        self.query_emis_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_emis_by_hash(&self, phone_hash: HashedIdentifier) -> ReadOutcome<PaymentRecord> {
        let data = IPaymentLedger::getEmisCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_emis", data, |bytes| -> LedgerResult<Vec<PaymentRecord>> {
                let entries = IPaymentLedger::getEmisCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_emis", e))?;
                convert_all(entries)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::codes::PaymentStatus;
    use crate::contracts::units::chain_time;
    use crate::sim::SimulatedNetwork;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_disbursement_then_emis() {
        let net = SimulatedNetwork::builder().build().unwrap();
        let payments = PaymentLedger::new(Some(net.context.clone()));

        let receipt = payments
            .submit_disbursement(&Disbursement {
                application_id: "APP-1".into(),
                phone: "+91-555-0100".into(),
                amount: Decimal::from(500_000),
                reference: "UTR-0042".into(),
            })
            .await;
        assert!(receipt.accepted);

        let due = chain_time(1_735_689_600).unwrap();
        let receipt = payments
            .submit_emi_payment(&EmiPayment {
                application_id: "APP-1".into(),
                phone: "+91-555-0100".into(),
                installment: 1,
                amount: Decimal::from_str("16525.50").unwrap(),
                due_date: due,
                status: PaymentStatus::Paid,
            })
            .await;
        assert!(receipt.accepted);

        let disbursements = payments.query_disbursements("+91-555-0100").await;
        assert_eq!(disbursements.records.len(), 1);
        assert_eq!(disbursements.records[0].reference_hash, HashedIdentifier::of("UTR-0042"));

        let emis = payments.query_emis("+91-555-0100").await;
        assert_eq!(emis.records.len(), 1);
        assert_eq!(emis.records[0].amount.to_string(), "16525.5");
        assert_eq!(emis.records[0].due_date, due);
        assert_eq!(emis.records[0].status, PaymentStatus::Paid);
    }
}
