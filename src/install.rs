//! Where the CLI itself is installed, and what that means for defaults

use std::path::{Path, PathBuf};

/// How the CLI was installed relative to the app that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallLayout {
    /// `<app>/node_modules/react-native/local-cli/util`, the layout every
    /// project created with `react-native init` has.
    NodeModules,
    /// `<app>/ios/Pods/React/packager`, installed through CocoaPods.
    CocoaPods,
    /// A development checkout of react-native, run in place.
    Checkout,
}

impl InstallLayout {
    const NODE_MODULES_TAIL: [&'static str; 4] = ["node_modules", "react-native", "local-cli", "util"];
    const COCOA_PODS_TAIL: [&'static str; 3] = ["Pods", "React", "packager"];

    /// Infer the layout from the trailing components of the CLI's directory.
    pub fn detect(dir: &Path) -> Self {
        if ends_with_components(dir, &Self::NODE_MODULES_TAIL) {
            InstallLayout::NodeModules
        } else if ends_with_components(dir, &Self::COCOA_PODS_TAIL) {
            InstallLayout::CocoaPods
        } else {
            InstallLayout::Checkout
        }
    }

    /// Levels between the CLI directory and the app's project root.
    fn project_depth(self) -> usize {
        match self {
            InstallLayout::NodeModules | InstallLayout::CocoaPods => 4,
            InstallLayout::Checkout => 2,
        }
    }

    /// Levels between the CLI directory and the react-native package root.
    fn package_depth(self) -> usize {
        match self {
            InstallLayout::NodeModules | InstallLayout::Checkout => 2,
            InstallLayout::CocoaPods => 1,
        }
    }
}

impl std::str::FromStr for InstallLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node-modules" => Ok(InstallLayout::NodeModules),
            "cocoa-pods" => Ok(InstallLayout::CocoaPods),
            "checkout" => Ok(InstallLayout::Checkout),
            other => Err(format!(
                "unknown layout '{}' (expected node-modules, cocoa-pods or checkout)",
                other
            )),
        }
    }
}

fn ends_with_components(dir: &Path, tail: &[&str]) -> bool {
    let components: Vec<_> = dir.components().map(|c| c.as_os_str()).collect();
    components.len() >= tail.len()
        && components[components.len() - tail.len()..]
            .iter()
            .zip(tail)
            .all(|(component, expected)| **component == **expected)
}

/// The CLI's own directory together with its install layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLocation {
    pub dir: PathBuf,
    pub layout: InstallLayout,
}

impl InstallLocation {
    pub fn new(dir: impl Into<PathBuf>, layout: InstallLayout) -> Self {
        Self {
            dir: dir.into(),
            layout,
        }
    }

    /// Use [`InstallLayout::detect`] on `dir`.
    pub fn detect(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let layout = InstallLayout::detect(&dir);
        Self { dir, layout }
    }

    /// Default project root for an app using this install.
    pub fn project_path(&self) -> PathBuf {
        up(&self.dir, self.layout.project_depth())
    }

    /// Root of the react-native package (where `Libraries/` lives).
    pub fn package_root(&self) -> PathBuf {
        up(&self.dir, self.layout.package_depth())
    }
}

fn up(dir: &Path, levels: usize) -> PathBuf {
    dir.ancestors()
        .nth(levels)
        .or_else(|| dir.ancestors().last())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf())
}
