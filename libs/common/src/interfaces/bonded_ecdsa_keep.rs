use alloy_sol_types::sol;

sol! {
    interface IBondedECDSAKeep {
        function submitPublicKey(bytes calldata public_key) external;

        function submitSignature(bytes32 r, bytes32 s, uint8 recovery_id) external;

        function isAwaitingSignature(bytes32 digest) external view returns (bool);

        function isActive() external view returns (bool);

        function digest() external view returns (bytes32);

        function getPublicKey() external view returns (bytes memory);

        function getMembers() external view returns (address[] memory);

        function hasKeyGenerationTimedOut() external view returns (bool);

        // -- Events --

        event PublicKeyPublished(bytes public_key);

        event ConflictingPublicKeySubmitted(address indexed submitting_member, bytes conflicting_public_key);

        event SignatureRequested(bytes32 indexed digest);

        event KeepClosed();

        event KeepTerminated();
    }
}
