use super::{AndroidDetector, Detector, DetectorContext, FastlaneDetector, IosDetector, PlatformId};

/// Ordered set of platform detectors.
///
/// Registration order is the priority order: results are reported in this
/// order and the first detected platform wins when one has to be picked
/// without asking. Defaults are android, ios, fastlane.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn with_defaults(ctx: DetectorContext) -> Self {
        let mut registry = Self::new();

        for id in PlatformId::all_variants() {
            let detector: Box<dyn Detector> = match id {
                PlatformId::Android => Box::new(AndroidDetector::new(ctx.clone())),
                PlatformId::Ios => Box::new(IosDetector::new(ctx.clone())),
                PlatformId::Fastlane => Box::new(FastlaneDetector::new(ctx.clone())),
            };
            registry.register(detector);
        }

        registry
    }

    /// Appends a detector; a second detector for the same platform is ignored
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        if self.get(detector.platform()).is_none() {
            self.detectors.push(detector);
        }
    }

    pub fn get(&self, platform: PlatformId) -> Option<&dyn Detector> {
        self.detectors
            .iter()
            .find(|d| d.platform() == platform)
            .map(|d| d.as_ref())
    }

    pub fn platforms(&self) -> Vec<PlatformId> {
        self.detectors.iter().map(|d| d.platform()).collect()
    }

    pub fn detectors_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Detector>> {
        self.detectors.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::pipeline::PipelineAssembler;
    use std::sync::Arc;

    fn ctx() -> DetectorContext {
        DetectorContext::new(
            Arc::new(MockFileSystem::new()),
            10,
            PipelineAssembler::default(),
        )
    }

    #[test]
    fn test_default_priority_order() {
        let registry = DetectorRegistry::with_defaults(ctx());
        assert_eq!(
            registry.platforms(),
            vec![PlatformId::Android, PlatformId::Ios, PlatformId::Fastlane]
        );
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut registry = DetectorRegistry::with_defaults(ctx());
        registry.register(Box::new(FastlaneDetector::new(ctx())));
        assert_eq!(registry.len(), 3);
        assert!(registry.get(PlatformId::Ios).is_some());
    }
}
