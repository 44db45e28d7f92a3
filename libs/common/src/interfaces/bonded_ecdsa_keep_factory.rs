use alloy_sol_types::sol;

sol! {
    interface IBondedECDSAKeepFactory {
        function registerMemberCandidate(address application) external;

        function updateOperatorStatus(address operator, address application) external;

        function hasMinimumStake(address operator) external view returns (bool);

        function balanceOf(address operator) external view returns (uint256);

        function isOperatorRegistered(address operator, address application) external view returns (bool);

        function isOperatorEligible(address operator, address application) external view returns (bool);

        function isOperatorUpToDate(address operator, address application) external view returns (bool);

        function getKeepCount() external view returns (uint256);

        function getKeepAtIndex(uint256 index) external view returns (address);

        // -- Events --

        event BondedECDSAKeepCreated(
            address indexed keep_address,
            address[] members,
            address indexed owner,
            address indexed application
        );
    }
}
