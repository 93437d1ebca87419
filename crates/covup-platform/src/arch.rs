//! Architecture detection.

/// CPU architecture families the uploader is published for, plus the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    ARM,
    ARM64,
    Unknown,
}

impl Arch {
    /// Map a kernel/`uname -m` style name onto an [`Arch`].
    pub fn parse(name: &str) -> Self {
        match name {
            "i386" | "i686" | "x86" => Arch::X86,
            "x86_64" | "amd64" => Arch::X86_64,
            "arm" | "armv7l" | "armv7" => Arch::ARM,
            "aarch64" | "arm64" => Arch::ARM64,
            _ => Arch::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::ARM => "arm",
            Arch::ARM64 => "aarch64",
            Arch::Unknown => "unknown",
        }
    }
}

/// Detect current architecture.
pub fn detect() -> Arch { Arch::parse(sysinfo::System::cpu_arch().as_str()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(Arch::parse("x86_64"), Arch::X86_64);
        assert_eq!(Arch::parse("amd64"), Arch::X86_64);
        assert_eq!(Arch::parse("aarch64"), Arch::ARM64);
        assert_eq!(Arch::parse("arm64"), Arch::ARM64);
        assert_eq!(Arch::parse("armv7l"), Arch::ARM);
        assert_eq!(Arch::parse("i686"), Arch::X86);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Arch::parse("riscv64"), Arch::Unknown);
        assert_eq!(Arch::parse(""), Arch::Unknown);
    }

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(detect(), detect());
    }
}
