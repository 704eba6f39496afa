/// Every user-facing text produced by taskgen.
///
/// Variants are grouped by the area that emits them; the text itself lives
/// in the `Display` implementation in `display.rs`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskSaved(String), // main task title
    TaskDeleted(String),
    TaskNotFoundWithId(String),
    TaskCompleted(String),
    TaskReopened(String),
    TasksNotFound,
    TasksHeader,
    SubtasksCount(usize),
    ConfirmDeleteTask(String),
    ConfirmSavePreview,
    PreviewHeader,
    PreviewDiscarded,
    GeneratedWithGemini,

    // === GENERATION MESSAGES ===
    Generating(String), // prompt
    PleaseProvidePrompt,
    GenerationFailed,
    GenerationEmptyResponse,
    GeminiApiKeyInvalid,
    GeminiApiKeyMissing,

    // === STORE MESSAGES ===
    StorePermissionDenied,
    StoreAddFailed,
    StoreUpdateFailed,
    StoreDeleteFailed,
    StoreLoadFailed,

    // === AUTHENTICATION MESSAGES ===
    SignedInAnonymously(String), // uid
    SignedOut,
    AnonymousLoginFailed(String),
    SignOutFailed(String),
    AuthNotConfigured,
    UsingLocalIdentity(String), // local id

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigModuleGemini,
    ConfigModuleFirebase,
    ConfigModuleImages,
    ImageNotFound(String), // path

    // === DATABASE MESSAGES ===
    RunningMigration(u32, String), // version, name
    MigrationFailed(u32, String),  // version, error

    // === PROMPTS ===
    PromptSelectModules,
    PromptGeminiApiKey,
    PromptGeminiModel,
    PromptGeminiApiUrl,
    PromptFirebaseProjectId,
    PromptFirebaseApiKey,
    PromptLocationImage,
    PromptRoomImage,

    // === GENERAL ===
    OperationCancelled,
}
