//! On-chain interface definitions.
//!
//! The `sol!` block mirrors the externally observed method/event contract
//! of the four university modules. Only the surface matters here; the
//! contract implementations themselves live outside this service.

use alloy::sol;

sol! {
    /// Emitted when a credential is recorded on the ledger.
    #[derive(Debug)]
    event CredentialIssued(uint256 indexed credentialId, address indexed studentAddress, string credentialType, address indexed issuedBy);

    /// Emitted when an issued credential is revoked.
    #[derive(Debug)]
    event CredentialRevoked(uint256 indexed credentialId, address indexed revokedBy, uint256 revokedAt);

    /// Emitted when a grade component is recorded.
    #[derive(Debug)]
    event GradeRecorded(uint256 indexed gradeId, uint256 indexed classId, address indexed studentAddress, string componentName, uint256 score, uint256 maxScore);

    /// Emitted when a recorded grade is approved.
    #[derive(Debug)]
    event GradeApproved(uint256 indexed gradeId, address indexed approvedBy);

    /// Emitted when a class is created.
    #[derive(Debug)]
    event ClassCreated(uint256 indexed classId, string classCode, address indexed lecturerAddress);

    function issueCredential(address studentAddress, string credentialType, string credentialData, uint256 expiresAt) returns (uint256 credentialId);
    function revokeCredential(uint256 credentialId);
    function isCredentialValid(uint256 credentialId) view returns (bool valid);

    function recordGrade(uint256 classId, address studentAddress, string componentName, uint256 score, uint256 maxScore) returns (uint256 gradeId);
    function approveGrade(uint256 gradeId);

    function createClass(string classCode, string className, address lecturerAddress, uint256 startDate, uint256 endDate, uint256 maxStudents) returns (uint256 classId);
}
