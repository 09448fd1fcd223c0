// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{EmptySubscription, RootNode};

use hackportal_api::graphql::{Mutation, Query};

fn main() {
    let schema = RootNode::new(
        Query,
        Mutation,
        EmptySubscription::<hackportal_api::graphql::Context>::new(),
    );

    let result = schema.as_sdl();

    std::fs::write("schema.gql", result).expect("Unable to write schema file");
}
