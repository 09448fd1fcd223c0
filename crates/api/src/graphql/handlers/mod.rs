// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod applications;
pub mod review;
pub mod sessions;
pub mod users;
