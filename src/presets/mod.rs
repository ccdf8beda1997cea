//! Named dependency bundles for common stack features.

use crate::compat::DependencyMap;

/// A named set of dependencies added together
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub dependencies: &'static [(&'static str, &'static str)],
}

impl Preset {
    pub fn dependency_map(&self) -> DependencyMap {
        self.dependencies
            .iter()
            .map(|(name, spec)| (name.to_string(), spec.to_string()))
            .collect()
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "next-auth",
        description: "NextAuth.js authentication with Prisma",
        dependencies: &[("next-auth", "^4.24.5"), ("@prisma/client", "^5.8.0")],
    },
    Preset {
        name: "clerk",
        description: "Clerk hosted authentication",
        dependencies: &[("@clerk/nextjs", "^4.29.1"), ("@clerk/themes", "^1.7.9")],
    },
    Preset {
        name: "firebase",
        description: "Firebase authentication and admin SDK",
        dependencies: &[
            ("firebase", "^10.7.1"),
            ("firebase-admin", "^12.0.0"),
            ("react-firebase-hooks", "^5.1.1"),
        ],
    },
    Preset {
        name: "shadcn",
        description: "shadcn/ui on Tailwind CSS",
        dependencies: &[
            ("tailwindcss", "^3.4.0"),
            ("postcss", "^8.4.31"),
            ("autoprefixer", "^10.4.16"),
            ("@radix-ui/react-icons", "^1.3.0"),
            ("class-variance-authority", "^0.7.0"),
            ("clsx", "^2.0.0"),
            ("tailwind-merge", "^2.0.0"),
        ],
    },
    Preset {
        name: "mui",
        description: "Material UI with Emotion",
        dependencies: &[
            ("@mui/material", "^5.15.3"),
            ("@mui/icons-material", "^5.15.3"),
            ("@emotion/react", "^11.11.3"),
            ("@emotion/styled", "^11.11.0"),
        ],
    },
    Preset {
        name: "dev-tools",
        description: "TypeScript, Jest, ESLint, Prettier and git hooks",
        dependencies: &[
            ("typescript", "^5.0.0"),
            ("@types/node", "^20.0.0"),
            ("@types/react", "^18.2.0"),
            ("@types/react-dom", "^18.2.0"),
            ("jest", "^29.7.0"),
            ("@testing-library/react", "^14.1.2"),
            ("@testing-library/jest-dom", "^6.2.0"),
            ("@testing-library/user-event", "^14.5.1"),
            ("jest-environment-jsdom", "^29.7.0"),
            ("eslint", "^8.56.0"),
            ("eslint-config-next", "14.0.0"),
            ("@typescript-eslint/parser", "^6.18.0"),
            ("@typescript-eslint/eslint-plugin", "^6.18.0"),
            ("eslint-plugin-react", "^7.33.2"),
            ("eslint-plugin-react-hooks", "^4.6.0"),
            ("eslint-plugin-jsx-a11y", "^6.8.0"),
            ("prettier", "^3.1.0"),
            ("eslint-config-prettier", "^9.1.0"),
            ("eslint-plugin-prettier", "^5.1.2"),
            ("husky", "^8.0.3"),
            ("lint-staged", "^15.2.0"),
        ],
    },
];

pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Dependencies of a preset, if it exists
pub fn preset(name: &str) -> Option<DependencyMap> {
    find(name).map(Preset::dependency_map)
}

pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
