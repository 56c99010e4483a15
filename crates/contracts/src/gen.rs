use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        struct PackedUserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;bytes32 accountGasLimits;uint256 preVerificationGas;bytes32 gasFees;bytes paymasterAndData;bytes signature;}
        function handleOps(PackedUserOperation[] calldata ops,address payable beneficiary) external;
        function balanceOf(address account) external view returns (uint256)
        function depositTo(address account) external payable
        function getUserOpHash(PackedUserOperation calldata userOp) external view returns (bytes32)
        error FailedOp(uint256 opIndex, string reason)
        error FailedOpWithRevert(uint256 opIndex, string reason, bytes inner)
        error PostOpReverted(bytes returnData)
    ]"#
);

abigen!(
    AccountFactoryAPI,
    r#"[
        function computeAddress(address template, bytes32 salt) external view returns (address)
        function createAccountWithSignature(address template, bytes initializer, bytes32 salt, bytes signature) external returns (address)
    ]"#
);

abigen!(
    PayableAccountAPI,
    r#"[
        function execute(bytes32 mode, bytes executionCalldata) external payable
        function installModule(uint256 moduleTypeId, address module, bytes initData) external payable
        function installRecoveryModule(address module, bytes data) external
    ]"#
);

abigen!(
    ValidatorAPI,
    r#"[
        struct PackedUserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;bytes32 accountGasLimits;uint256 preVerificationGas;bytes32 gasFees;bytes paymasterAndData;bytes signature;}
        function getUopHash(address entryPoint, PackedUserOperation calldata userOp) external view returns (bytes32)
    ]"#
);

abigen!(
    HelperAPI,
    r#"[
        function getValidationData(uint256 expireTime) external view returns (uint256)
        function encodeUopHash(bytes32 entryPointHash, uint256 validationData) external pure returns (bytes32)
        function recoverAddress(bytes signature, bytes32 hash) external pure returns (address)
        function getClientJson(string clientDataJSONPre, string clientDataJSONPost, bytes32 uopHash) external pure returns (string, bytes)
        function passkeyVerify(bytes32 uopHash, uint256 r, uint256 s, uint256 pubKeyX, uint256 pubKeyY, uint256 verifyType, string clientJson) external view returns (bool)
        function encodePasskeySig(uint256 r, uint256 s, uint256 verifyType, string clientJson) external pure returns (bytes)
        function getSignature2(uint256 pubKeyX, uint256 pubKeyY, bytes passkeySig, bytes eoaSig, uint256 validationData) external pure returns (bytes)
        function getAccountInitializer2(uint256 pubKeyX, uint256 pubKeyY, address validator, address owner, address sender, bytes recoveryInstall, bytes fallbackInstall) external view returns (bytes)
        function getFactoryCreateAccountHash(address factory, bytes32 salt, uint256 expireTime, bytes initializer) external view returns (bytes32)
        function getPackedSig(uint256 expireTime, bytes signature) external pure returns (bytes)
    ]"#
);

abigen!(
    ConfigAPI,
    r#"[
        function addWhitelistedBundlers(address[] bundlers) external
        function addFactorySigners(address[] signers) external
        function addPaySigners(address[] signers) external
        function isWhitelistedBundler(address bundler) external view returns (bool)
        function isFactorySigner(address signer) external view returns (bool)
        function isPaySigner(address signer) external view returns (bool)
    ]"#
);

abigen!(
    TestTokenAPI,
    r#"[
        function mint(address to, uint256 amount) external
        function approve(address spender, uint256 amount) external returns (bool)
        function transfer(address to, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

abigen!(
    PayAPI,
    r#"[
        struct Cheque {uint256 chequeId;address to;address tokenAddress;uint256 amount;bytes32 expiration;}
        function send(Cheque cheque) external
    ]"#
);
