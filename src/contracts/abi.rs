//! Static interface descriptors for the four ledger contracts.
//!
//! Field order is part of the wire format: changing it breaks decoding of
//! everything already on chain.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct LoanEntry {
        bytes32 phoneHash;
        bytes32 applicationHash;
        uint256 amount;
        uint16 interestBps;
        uint16 tenureMonths;
        uint8 status;
        uint64 timestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ChatEntry {
        bytes32 sessionHash;
        bytes32 phoneHash;
        bytes32 messageHash;
        bytes32 responseHash;
        string intent;
        uint64 timestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct DocumentEntry {
        bytes32 applicationHash;
        bytes32 phoneHash;
        bytes32 documentHash;
        uint8 docType;
        bool verified;
        uint64 timestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct CreditEntry {
        bytes32 phoneHash;
        bytes32 applicationHash;
        uint16 score;
        uint8 grade;
        uint64 timestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct DisbursementEntry {
        bytes32 applicationHash;
        bytes32 phoneHash;
        uint256 amount;
        bytes32 referenceHash;
        uint64 timestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct EmiEntry {
        bytes32 applicationHash;
        bytes32 phoneHash;
        uint16 installment;
        uint256 amount;
        uint64 dueDate;
        uint8 status;
        uint64 timestamp;
    }

    interface ILoanRegistry {
        function logApplication(bytes32 phoneHash, bytes32 applicationHash, uint256 amount, uint16 interestBps, uint16 tenureMonths, uint8 status) external;
        function logChatTurn(bytes32 sessionHash, bytes32 phoneHash, bytes32 messageHash, bytes32 responseHash, string intent) external;
        function logDocument(bytes32 applicationHash, bytes32 phoneHash, bytes32 documentHash, uint8 docType, bool verified) external;
        function getLoansByPhone(bytes32 phoneHash) external view returns (LoanEntry[] memory);
        function getChatLogs(bytes32 phoneHash) external view returns (ChatEntry[] memory);
        function getDocuments(bytes32 phoneHash) external view returns (DocumentEntry[] memory);
    }

    interface ICreditRegistry {
        function recordCreditScore(bytes32 phoneHash, bytes32 applicationHash, uint16 score, uint8 grade) external;
        function getCreditHistory(bytes32 phoneHash) external view returns (CreditEntry[] memory);
    }

    interface IPaymentLedger {
        function recordDisbursement(bytes32 applicationHash, bytes32 phoneHash, uint256 amount, bytes32 referenceHash) external;
        function recordEmiPayment(bytes32 applicationHash, bytes32 phoneHash, uint16 installment, uint256 amount, uint64 dueDate, uint8 status) external;
        function getDisbursements(bytes32 phoneHash) external view returns (DisbursementEntry[] memory);
        function getEmis(bytes32 phoneHash) external view returns (EmiEntry[] memory);
    }

    interface IAccessControl {
        function isAuthorized(address account) external view returns (bool);
        function grantWriter(address account) external;
        function revokeWriter(address account) external;
    }
}
