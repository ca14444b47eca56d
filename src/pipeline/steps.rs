//! Known pipeline steps and their pinned versions

use super::model::{EnvItem, Step, StepListItem};

/// A step identifier pinned to one version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub id: &'static str,
    pub version: &'static str,
}

impl StepInfo {
    /// `id@version` form used in workflow step lists
    pub fn reference(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }

    pub fn item(&self, step: Step) -> StepListItem {
        StepListItem {
            reference: self.reference(),
            step,
        }
    }

    pub fn bare(&self) -> StepListItem {
        self.item(Step::default())
    }

    pub fn with_inputs(&self, inputs: Vec<EnvItem>) -> StepListItem {
        self.item(Step {
            inputs,
            ..Default::default()
        })
    }
}

pub const ACTIVATE_SSH_KEY: StepInfo = StepInfo {
    id: "activate-ssh-key",
    version: "3.1.1",
};
pub const GIT_CLONE: StepInfo = StepInfo {
    id: "git-clone",
    version: "3.4.1",
};
pub const CACHE_PULL: StepInfo = StepInfo {
    id: "cache-pull",
    version: "0.9.2",
};
pub const CACHE_PUSH: StepInfo = StepInfo {
    id: "cache-push",
    version: "0.9.4",
};
pub const SCRIPT: StepInfo = StepInfo {
    id: "script",
    version: "1.1.3",
};
pub const INSTALL_MISSING_ANDROID_TOOLS: StepInfo = StepInfo {
    id: "install-missing-android-tools",
    version: "1.0.3",
};
pub const GRADLE_RUNNER: StepInfo = StepInfo {
    id: "gradle-runner",
    version: "1.5.2",
};
pub const CERTIFICATE_AND_PROFILE_INSTALLER: StepInfo = StepInfo {
    id: "certificate-and-profile-installer",
    version: "1.8.1",
};
pub const RECREATE_USER_SCHEMES: StepInfo = StepInfo {
    id: "recreate-user-schemes",
    version: "0.9.4",
};
pub const XCODE_TEST: StepInfo = StepInfo {
    id: "xcode-test",
    version: "1.17.1",
};
pub const XCODE_ARCHIVE: StepInfo = StepInfo {
    id: "xcode-archive",
    version: "2.0.4",
};
pub const FASTLANE: StepInfo = StepInfo {
    id: "fastlane",
    version: "2.2.0",
};
pub const DEPLOY_TO_BITRISE_IO: StepInfo = StepInfo {
    id: "deploy-to-bitrise-io",
    version: "1.2.5",
};

pub const ALL_STEPS: &[StepInfo] = &[
    ACTIVATE_SSH_KEY,
    GIT_CLONE,
    CACHE_PULL,
    CACHE_PUSH,
    SCRIPT,
    INSTALL_MISSING_ANDROID_TOOLS,
    GRADLE_RUNNER,
    CERTIFICATE_AND_PROFILE_INSTALLER,
    RECREATE_USER_SCHEMES,
    XCODE_TEST,
    XCODE_ARCHIVE,
    FASTLANE,
    DEPLOY_TO_BITRISE_IO,
];

/// Secret whose presence gates key activation at run time
pub const SSH_KEY_ENV: &str = "SSH_RSA_PRIVATE_KEY";

pub fn lookup(id: &str) -> Option<StepInfo> {
    ALL_STEPS.iter().copied().find(|s| s.id == id)
}

pub fn activate_ssh_key() -> StepListItem {
    ACTIVATE_SSH_KEY.item(Step {
        run_if: Some(format!("{{{{getenv \"{}\" | ne \"\"}}}}", SSH_KEY_ENV)),
        ..Default::default()
    })
}

pub fn script(title: &str) -> StepListItem {
    SCRIPT.item(Step {
        title: Some(title.to_string()),
        ..Default::default()
    })
}
