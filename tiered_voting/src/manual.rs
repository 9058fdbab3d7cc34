/*!

This is the long-form manual for `tiered_voting` and `tvote`.

## How a run works

A voter whittles a list of ideas down over up to three rounds. In every round
the surviving ideas are split into groups, and the voter gives each idea of
the active group a score of `0`, `1` or `2`. Clicking the same score twice
clears it.

* **Round 1**: one group with every idea. This group has a quota: only a share
  of the ideas may receive a `2`, and only a share may receive a `1`. Ideas
  scored `0` are eliminated.
* **Round 2**: the ideas scored `2` in round 1 form the first group, the ideas
  scored `1` form the second group. There is no quota. Each idea now has a
  cumulative score (round 1 + round 2).
* **Round 3**: the ideas with a cumulative score of at least `3` are grouped
  by that score, highest first. There is no quota.

The final score of an idea is the sum of its scores in the rounds it reached.
The ranking lists every idea, best first. Ideas with the same final score keep
the order in which they were given.

The run ends early when a round has nobody left to vote on.

## Quotas

With `n` ideas in the opening group and a share of `p` percent, the limit is
`n * p / 100`, rounded down (`floor`) or up (`ceiling`). The default rules
allow 20% of `2`s and 40% of `1`s, rounded up: 4 and 8 ideas out of 20.
The legacy rules allow 40% of `2`s and 30% of `1`s, rounded down.

A score that would go over the limit is refused and nothing changes. Moving
an idea from one score to another only counts the idea once.

## Configuration

`tvote` reads an optional JSON configuration file:

```text
{
  "outputSettings": { "contestName": "Q3 roadmap" },
  "itemSources": [ { "provider": "csv", "filePath": "ideas.csv" } ],
  "actionsPath": "session.json",
  "rules": {
    "topTierPercent": 20,
    "midTierPercent": 40,
    "quotaRounding": "ceiling"
  }
}
```

Paths are relative to the configuration file. Command line flags override
the values of the file.

## Input formats

### `csv`

```text
id,title,description
1,Dark mode,Let users switch themes
2,Offline support,Work without a connection
```

The header row is optional. The `id` column is optional: without it, ideas
are numbered from 1 in file order.

### `json`

An array of `{"id": 1, "title": "...", "description": "..."}` objects.

### Sessions

A session is the list of requests of one voter, replayed in order:

```text
[
  { "assign": { "item": 1, "score": 2 } },
  { "assign": { "item": 2, "score": 0 } },
  "advance",
  "reset"
]
```

Refused requests are reported in the output and do not stop the replay.

## Output

The summary lists the configuration, the final ranking, every finalized
group and the refused requests. The scores of a group are listed as
`{"id": .., "score": ..}` objects in the order the group showed its ideas.
Several summaries can be combined with
`--tally` to get the average score of each idea over all voters.

 */
